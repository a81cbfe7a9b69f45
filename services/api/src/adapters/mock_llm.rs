//! services/api/src/adapters/mock_llm.rs
//!
//! The local deterministic generation backend, selected when no real
//! provider credential is configured. Dispatches on category keywords in
//! the prompt and returns one of two fixed template documents; this path
//! never fails and never performs I/O.

use async_trait::async_trait;
use healing_companion_core::ports::{GenerationError, ReportGenerator};
use tracing::debug;

const FALLBACK_CONTENT: &str = "AI生成的模拟内容";

const MOCK_SUMMARY: &str = r#"# 儿童疗愈总结报告

## 整体表现评估
在本阶段的疗愈过程中，儿童整体表现良好，展现出积极的康复态度和明显的进步迹象。通过系统性的治疗干预，儿童在多个发展维度上都取得了可观的改善。

## 进步亮点
- **情绪调节能力显著提升**：从初期的情绪波动较大，到现在能够较好地控制和表达情绪
- **社交互动意愿增强**：主动与治疗师和同伴交流的频率明显增加
- **注意力集中度改善**：能够在活动中保持更长时间的专注
- **自理能力提升**：在日常生活技能方面表现出更强的独立性

## 行为模式分析
儿童的行为模式呈现出积极的变化趋势：
- 晨间情绪状态更加稳定
- 对新环境和新活动的适应能力增强
- 规则意识和配合度显著提高
- 挫折耐受性有所改善

## 社交互动情况
- 与治疗师建立了良好的信任关系
- 开始主动寻求帮助和支持
- 在小组活动中表现出更好的合作精神
- 对他人情绪的感知和回应能力提升

## 学习能力表现
- 新技能学习速度加快
- 记忆保持能力增强
- 模仿学习能力显著提升
- 对指令的理解和执行更加准确

## 需要关注的问题
- 在面对复杂任务时仍需要更多支持
- 某些特定情境下的焦虑反应需要继续关注
- 精细动作技能还有进一步提升空间

## 阶段性成果总结
本阶段治疗取得了显著成效，儿童在情绪管理、社交互动、学习能力等方面都有明显进步。建议继续当前的治疗方案，并适当增加挑战性活动以促进进一步发展。"#;

const MOCK_SUGGESTION: &str = r#"# 儿童疗愈建议报告

## 治疗方案优化建议

### 情绪管理训练强化
基于当前观察到的情绪调节能力提升，建议进一步深化情绪管理训练：
- **情绪识别练习**：使用情绪卡片和表情镜像游戏，帮助儿童更准确地识别和命名情绪
- **情绪调节技巧**：教授深呼吸、数数法、正念冥想等具体的情绪调节策略
- **情绪表达训练**：通过角色扮演和情境模拟，练习适当的情绪表达方式

### 社交技能发展计划
针对社交互动能力的改善趋势，制定系统性的社交技能培养方案：
- **同伴互动活动**：组织小组游戏和合作任务，增加与同龄人的互动机会
- **沟通技巧训练**：练习主动打招呼、请求帮助、表达需求等基础社交技能
- **冲突解决能力**：教授处理分歧和冲突的健康方式

### 认知能力提升策略
基于学习能力的积极表现，建议实施以下认知训练：
- **注意力训练**：通过专注力游戏和任务，进一步提升持续注意力
- **记忆力强化**：使用记忆游戏和重复练习，巩固记忆保持能力
- **问题解决训练**：设计适龄的逻辑推理和问题解决任务

## 日常生活技能发展

### 自理能力提升
- **生活技能训练**：系统性地教授和练习日常生活必需技能
- **独立性培养**：逐步减少辅助，鼓励独立完成适龄任务
- **责任感建立**：分配适当的家务和责任，培养责任意识

### 运动协调能力
- **大运动技能**：通过体育活动和户外游戏提升大肌肉群协调性
- **精细动作训练**：使用手工制作、绘画等活动提升手眼协调能力
- **感觉统合训练**：针对感觉处理问题进行专项训练

## 环境支持建议

### 家庭环境优化
- **结构化环境**：建立清晰的日常作息和规则体系
- **积极强化**：及时给予正面反馈和鼓励，增强自信心
- **安全感建立**：创造稳定、可预测的家庭环境

### 学校配合方案
- **个别化教育计划**：与学校合作制定适合的学习支持方案
- **教师沟通**：定期与教师交流，确保治疗目标的一致性
- **同伴支持**：培养同学间的理解和支持关系

## 长期发展规划

### 阶段性目标设定
- **短期目标（1-3个月）**：巩固当前进步，重点提升情绪稳定性
- **中期目标（3-6个月）**：扩展社交圈子，提升学习适应能力
- **长期目标（6-12个月）**：实现更高程度的独立性和社会适应性

### 持续监测指标
- 情绪调节频率和效果
- 社交互动的主动性和质量
- 学习任务的完成情况
- 日常生活技能的掌握程度

## 家长参与建议

### 家庭治疗配合
- **一致性原则**：确保家庭和治疗环境的方法一致
- **耐心支持**：给予充分的时间和空间让儿童适应和成长
- **积极参与**：主动学习相关知识，参与治疗过程

### 日常观察记录
- 记录儿童的行为变化和进步表现
- 注意观察可能的退步信号
- 及时与治疗团队沟通反馈

## 注意事项与风险防范

### 潜在风险识别
- 避免过度期待导致的压力
- 防止治疗疲劳和抗拒情绪
- 注意个体差异，避免一刀切的方法

### 应急处理预案
- 制定情绪爆发时的应对策略
- 建立支持网络和求助渠道
- 定期评估和调整治疗方案

通过以上综合性的建议和支持措施，相信能够进一步促进儿童的全面发展和康复进程。"#;

/// A generation backend that returns fixed template documents.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!("Generating report content with the deterministic mock backend");
        let content = if prompt.contains("summary") {
            MOCK_SUMMARY
        } else if prompt.contains("suggestion") {
            MOCK_SUGGESTION
        } else {
            FALLBACK_CONTENT
        };
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healing_companion_core::domain::ReportCategory;
    use healing_companion_core::prompt::build_prompt;

    #[tokio::test]
    async fn summary_keyword_selects_the_summary_template() {
        let prompt = build_prompt(&[], ReportCategory::DailySummary);
        let content = MockGenerator::new().generate(&prompt).await.unwrap();
        assert_eq!(content, MOCK_SUMMARY);
    }

    #[tokio::test]
    async fn suggestion_keyword_selects_the_suggestion_template() {
        let prompt = build_prompt(&[], ReportCategory::Suggestions);
        let content = MockGenerator::new().generate(&prompt).await.unwrap();
        assert_eq!(content, MOCK_SUGGESTION);
    }

    #[tokio::test]
    async fn unmatched_prompt_returns_the_literal_fallback() {
        let prompt = build_prompt(&[], ReportCategory::Generic);
        let content = MockGenerator::new().generate(&prompt).await.unwrap();
        assert_eq!(content, FALLBACK_CONTENT);
    }

    #[tokio::test]
    async fn mock_output_is_deterministic() {
        let prompt = build_prompt(&[], ReportCategory::DailySummary);
        let generator = MockGenerator::new();
        let a = generator.generate(&prompt).await.unwrap();
        let b = generator.generate(&prompt).await.unwrap();
        assert_eq!(a, b);
    }
}
