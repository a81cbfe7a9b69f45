//! crates/healing_companion_core/src/prompt.rs
//!
//! The prompt builder: deterministically assembles the long-form
//! instruction document handed to a generation backend. Pure string
//! assembly - no I/O, no randomness, no hidden state.

use std::fmt::Write;

use crate::domain::{JournalEntry, MediaKind, ReportCategory};

//=========================================================================================
// Fixed Framing Blocks
//=========================================================================================

/// Persona block opening every prompt.
const SYSTEM_ROLE: &str = r#"你是一位资深的儿童康复治疗师和心理健康专家，拥有超过15年的儿童发展和康复治疗经验。你专门从事儿童特殊需要康复、行为干预、情绪管理和发展评估工作。

你的专业背景包括：
- 儿童心理学和发展心理学专业知识
- 应用行为分析(ABA)治疗经验
- 感觉统合训练专业资质
- 家庭系统治疗和亲子关系指导经验
- 多元化康复方案设计和实施能力

请基于提供的疗愈记录数据，运用你的专业知识和临床经验，生成一份详细、专业且具有实际指导价值的分析报告。

"#;

const PROFESSIONAL_REQUIREMENTS: &str = r#"**专业标准和质量要求：**

1. **专业性要求：**
   - 使用儿童康复治疗领域的专业术语和概念
   - 体现循证实践的理念和方法
   - 展现多学科整合的治疗视角
   - 遵循儿童发展的科学规律

2. **内容深度要求：**
   - 每个分析点都要有具体的观察描述和专业解释
   - 提供可量化的改善指标和具体例证
   - 包含对行为背后原因的深层分析
   - 给出基于证据的专业判断和建议

3. **实用性要求：**
   - 所有建议都必须具体可操作
   - 提供明确的实施步骤和方法
   - 考虑家庭和学校的实际执行条件
   - 包含风险评估和应对策略

4. **语言表达要求：**
   - 使用温暖、积极但客观的专业语调
   - 避免过于技术性的术语，确保家长能够理解
   - 平衡希望与现实，既要鼓励又要客观
   - 体现对儿童和家庭的尊重与支持

"#;

const FORMAT_REQUIREMENTS: &str = r#"**输出格式和结构要求：**

1. **格式规范：**
   - 严格使用Markdown格式
   - 使用清晰的标题层级（#、##、###）
   - 合理使用列表、加粗、斜体等格式
   - 确保排版美观、层次分明

2. **内容长度：**
   - 总报告长度控制在1200-1500字
   - 各部分内容要均衡分配
   - 重点部分可以适当详细
   - 避免冗余和重复表述

3. **结构完整性：**
   - 必须包含所有要求的分析维度
   - 每个部分都要有实质性内容
   - 逻辑清晰，前后呼应
   - 结论明确，建议具体

4. **专业报告标准：**
   - 开头要有简明的概述
   - 中间部分要有详细的分析
   - 结尾要有明确的总结和建议
   - 整体体现专业水准和临床价值

**现在请开始生成专业的儿童康复分析报告：**

"#;

//=========================================================================================
// Per-category Template Triples
//=========================================================================================

struct CategoryTemplates {
    task: &'static str,
    requirements: &'static str,
    structure: &'static str,
}

// The task header embeds the canonical category tag so downstream
// keyword-based dispatch (the deterministic mock) can recognize it.
fn templates_for(category: ReportCategory) -> CategoryTemplates {
    match category {
        ReportCategory::DailySummary => CategoryTemplates {
            task: r#"**任务：生成日常疗愈总结报告（daily_summary）**

你需要分析儿童在指定时间段内的疗愈进展，重点关注日常表现的变化和改善情况。这份报告将帮助家长和治疗团队了解儿童的当前状态和进步情况。

"#,
            requirements: r#"**详细分析要求：**

请从以下维度进行深入分析，每个维度都要提供具体的观察和评估：

1. **整体表现评估**（200-250字）
   - 总结儿童在此期间的整体康复态度和配合程度
   - 描述儿童的精神状态和活力水平变化
   - 评估治疗参与度和主动性表现
   - 分析整体发展趋势和康复进程

2. **进步亮点识别**（250-300字）
   - 详细描述3-4个最显著的进步表现，每个进步都要有具体例证
   - 量化改善程度（如：从每天3次情绪爆发减少到1次）
   - 对比治疗前后的具体变化
   - 突出里程碑式的突破和成就

3. **行为模式深度分析**（200-250字）
   - 分析儿童的日常行为规律和模式变化
   - 识别触发积极/消极行为的环境因素
   - 评估自我调节能力的发展情况
   - 描述适应性行为的增加和问题行为的减少

4. **社交互动能力评估**（150-200字）
   - 评估与治疗师、家长、同伴的互动质量
   - 分析沟通技巧和表达能力的变化
   - 描述社交主动性和合作能力的发展
   - 评估情绪共鸣和社会认知能力

5. **学习认知能力表现**（150-200字）
   - 分析注意力持续时间和集中度变化
   - 评估记忆力、理解力和执行功能
   - 描述新技能学习速度和掌握程度
   - 分析问题解决能力和创造性思维发展

6. **需要持续关注的挑战**（100-150字）
   - 客观识别仍需改进的具体方面
   - 分析可能的发展瓶颈和障碍
   - 提出需要加强的技能领域
   - 预警可能出现的退步风险

"#,
            structure: r#"**报告结构示例：**
# 儿童疗愈总结报告

## 整体表现评估
[详细描述整体状态和康复态度]

## 进步亮点
- **[具体能力]显著提升**：[具体描述和例证]
- **[另一能力]明显改善**：[具体描述和例证]
[继续列出其他进步点]

## 行为模式分析
[分析行为规律和变化趋势]

## 社交互动情况
[评估社交能力发展]

## 学习能力表现
[分析认知和学习表现]

## 需要关注的问题
[客观指出需要改进的方面]

## 阶段性成果总结
[总结本阶段治疗成效和建议]

"#,
        },
        ReportCategory::Suggestions => CategoryTemplates {
            task: r#"**任务：生成康复建议报告（suggestions）**

你需要基于疗愈记录提供专业的康复建议和下一步治疗方案。这份报告将为治疗团队和家长提供具体可操作的指导建议。

"#,
            requirements: r#"**详细建议要求：**

请提供以下方面的专业建议，每个建议都要具体可操作：

1. **治疗方案优化建议**（300-400字）
   - 基于当前进展调整治疗重点和策略
   - 提供3-4个具体的治疗技术和方法
   - 建议治疗频率和强度调整
   - 制定个性化的干预计划

2. **日常生活技能发展计划**（250-300字）
   - 自理能力提升的具体训练方法
   - 运动协调能力发展建议
   - 生活技能学习的阶段性目标
   - 独立性培养的渐进式方案

3. **环境支持和优化建议**（200-250字）
   - 家庭环境结构化改善建议
   - 学校配合和支持方案
   - 社交环境优化措施
   - 感官环境调节建议

4. **长期发展规划**（200-250字）
   - 短期目标（1-3个月）的具体设定
   - 中期目标（3-6个月）的发展方向
   - 长期目标（6-12个月）的愿景规划
   - 各阶段的评估指标和里程碑

5. **家长参与和配合指导**（200-250字）
   - 家庭治疗配合的具体方法
   - 日常观察和记录的要点
   - 亲子互动技巧和策略
   - 家长心理支持和自我照顾建议

6. **风险防范和应急预案**（150-200字）
   - 识别潜在的治疗风险和挑战
   - 制定行为危机的应对策略
   - 建立支持网络和求助渠道
   - 定期评估和方案调整机制

"#,
            structure: r#"**报告结构示例：**
# 儿童疗愈建议报告

## 治疗方案优化建议

### [具体治疗领域]强化
[详细的训练方法和技巧]

### [另一治疗领域]发展计划
[系统性的培养方案]

## 日常生活技能发展
### 自理能力提升
[具体的训练建议]

### 运动协调能力
[发展计划和活动建议]

## 环境支持建议
### 家庭环境优化
[具体的改善措施]

### 学校配合方案
[协作建议和支持方案]

## 长期发展规划
### 阶段性目标设定
[具体的时间节点和目标]

### 持续监测指标
[评估标准和观察要点]

## 家长参与建议
[详细的配合指导]

## 注意事项与风险防范
[风险识别和应对策略]

"#,
        },
        ReportCategory::Progress => CategoryTemplates {
            task: r#"**任务：生成进度分析报告（progress）**

你需要分析儿童的康复进度，评估治疗效果和发展趋势。这份报告将帮助评估当前治疗方案的有效性并指导后续调整。

"#,
            requirements: r#"**详细进度分析要求：**

请进行以下深度分析，尽可能量化和具体化：

1. **基线对比分析**（250-300字）
   - 与治疗初期状态进行详细对比
   - 量化各项能力的改善程度
   - 使用具体数据和百分比描述进步
   - 识别最显著的变化领域

2. **发展轨迹评估**（200-250字）
   - 分析各项能力的发展速度和趋势
   - 评估发展的稳定性和持续性
   - 识别发展的关键转折点
   - 预测未来发展方向

3. **治疗效果量化评估**（200-250字）
   - 评估不同治疗方法的有效性
   - 分析治疗目标的达成情况
   - 量化投入产出比和效率
   - 识别最有效的干预策略

4. **里程碑达成情况**（150-200字）
   - 评估重要发展里程碑的达成状况
   - 分析达成时间是否符合预期
   - 识别超预期和滞后的发展领域
   - 调整后续里程碑设定

5. **瓶颈和挑战分析**（150-200字）
   - 识别当前面临的主要发展瓶颈
   - 分析阻碍进步的内外因素
   - 评估挑战的严重程度和影响
   - 提出突破瓶颈的策略建议

6. **未来发展预测**（100-150字）
   - 基于当前趋势预测未来发展
   - 评估达到长期目标的可能性
   - 识别需要重点关注的发展领域
   - 建议治疗方案的调整方向

"#,
            structure: r#"**报告结构示例：**
# 儿童康复进度分析报告

## 基线对比分析
[详细的前后对比和量化数据]

## 发展轨迹评估
[各能力发展趋势分析]

## 治疗效果量化评估
[具体的效果评估和数据]

## 里程碑达成情况
[重要节点的达成分析]

## 瓶颈和挑战分析
[发展障碍的识别和分析]

## 未来发展预测
[基于数据的发展预测]

"#,
        },
        ReportCategory::Generic => CategoryTemplates {
            task: r#"**任务：生成综合分析报告（generic）**
请对儿童的整体疗愈情况进行全面综合分析。

"#,
            requirements: r#"**分析要求：**
请进行全面的综合分析，包括进展评估、问题识别和改进建议。

"#,
            structure: r#"**报告结构：**
请按照专业报告格式组织内容。

"#,
        },
    }
}

//=========================================================================================
// Data Section
//=========================================================================================

const NO_DATA_NOTICE: &str = "**数据状态：** 当前暂无具体的疗愈记录数据。\n\n**分析说明：** 由于缺乏具体的疗愈记录，请基于你的专业经验和临床知识，生成一份符合儿童康复治疗标准的专业报告。报告应体现典型的康复进展模式和专业的治疗建议。\n\n";

/// Renders the journal-entry data section. Entries are assumed oldest
/// first; the span line reads first/last by array position.
fn render_data_section(entries: &[JournalEntry]) -> String {
    let mut out = String::new();
    out.push_str("**疗愈记录数据分析：**\n\n");

    if entries.is_empty() {
        out.push_str(NO_DATA_NOTICE);
        return out;
    }

    let first = &entries[0];
    let last = &entries[entries.len() - 1];
    let _ = writeln!(
        out,
        "**数据概览：** 共收集到 {} 条疗愈记录，时间跨度从 {} 到 {}\n",
        entries.len(),
        first.created_at.format("%Y年%m月%d日"),
        last.created_at.format("%Y年%m月%d日"),
    );

    out.push_str("**详细记录内容：**\n");
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n**记录 {}**（{}）",
            i + 1,
            entry.created_at.format("%Y年%m月%d日 %H:%M"),
        );
        let _ = writeln!(out, "- **记录内容：** {}", entry.content);

        if !entry.media.is_empty() {
            out.push_str("- **附件媒体：** ");
            out.push_str(&media_tally(entry));
            out.push_str("（这些媒体文件提供了额外的行为观察和进展证据）\n");
        }

        out.push_str("- **分析要点：** 请重点关注此记录中体现的行为变化、情绪状态、技能表现和社交互动情况\n");
    }
    out.push_str("\n**数据分析指导：** 请基于以上记录内容，结合时间序列分析儿童的发展变化趋势，识别进步模式和需要关注的问题。\n\n");

    out
}

/// Human-readable tally of an entry's media by kind, e.g. "2个image文件、1个video文件".
fn media_tally(entry: &JournalEntry) -> String {
    let mut parts = Vec::new();
    for kind in [MediaKind::Image, MediaKind::Video] {
        let count = entry.media.iter().filter(|m| m.kind == kind).count();
        if count > 0 {
            parts.push(format!("{}个{}文件", count, kind.as_str()));
        }
    }
    parts.join("、")
}

//=========================================================================================
// Builder
//=========================================================================================

/// Assembles the full instruction document for a generation backend.
///
/// Output is byte-identical for identical inputs. Zero entries is a valid
/// input and produces the explicit no-data notice instead of entry blocks.
pub fn build_prompt(entries: &[JournalEntry], category: ReportCategory) -> String {
    let templates = templates_for(category);

    let mut prompt = String::with_capacity(8 * 1024);
    prompt.push_str(SYSTEM_ROLE);
    prompt.push_str(templates.task);
    prompt.push_str(&render_data_section(entries));
    prompt.push_str(templates.requirements);
    prompt.push_str(templates.structure);
    prompt.push_str(PROFESSIONAL_REQUIREMENTS);
    prompt.push_str(FORMAT_REQUIREMENTS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Media;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn entry(id: i64, y: i32, m: u32, d: u32, content: &str) -> JournalEntry {
        JournalEntry {
            id,
            child_archive_id: Uuid::nil(),
            content: content.to_string(),
            media: Vec::new(),
            created_at: Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let entries = vec![
            entry(1, 2024, 1, 5, "进步明显"),
            entry(2, 2024, 1, 10, "情绪稳定"),
        ];
        let a = build_prompt(&entries, ReportCategory::Progress);
        let b = build_prompt(&entries, ReportCategory::Progress);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_entry_list_emits_no_data_notice() {
        let prompt = build_prompt(&[], ReportCategory::DailySummary);
        assert!(prompt.contains("当前暂无具体的疗愈记录数据"));
        assert!(!prompt.contains("**记录 1**"));
        assert!(!prompt.contains("**数据概览：**"));
    }

    #[test]
    fn generic_category_uses_fallback_blocks() {
        let entries = vec![entry(1, 2024, 3, 1, "社交主动")];
        let prompt = build_prompt(&entries, ReportCategory::Generic);
        assert!(prompt.contains("生成综合分析报告"));
        assert!(prompt.contains("请进行全面的综合分析"));
        assert!(prompt.contains("请按照专业报告格式组织内容"));
    }

    #[test]
    fn data_section_reports_count_and_span() {
        let entries = vec![
            entry(1, 2024, 1, 5, "进步明显"),
            entry(2, 2024, 1, 10, "情绪稳定"),
            entry(3, 2024, 1, 15, "社交主动"),
        ];
        let prompt = build_prompt(&entries, ReportCategory::DailySummary);
        assert!(prompt.contains("共收集到 3 条疗愈记录"));
        assert!(prompt.contains("从 2024年01月05日 到 2024年01月15日"));
        assert!(prompt.contains("**记录 1**（2024年01月05日 09:30）"));
        assert!(prompt.contains("**记录 3**"));
        assert!(prompt.contains("- **记录内容：** 情绪稳定"));
    }

    #[test]
    fn media_attachments_are_tallied_by_kind() {
        let mut e = entry(1, 2024, 2, 1, "观察记录");
        e.media = vec![
            Media {
                id: 1,
                journal_entry_id: 1,
                kind: MediaKind::Image,
                url: "https://cdn.example.com/a.jpg".to_string(),
            },
            Media {
                id: 2,
                journal_entry_id: 1,
                kind: MediaKind::Image,
                url: "https://cdn.example.com/b.jpg".to_string(),
            },
            Media {
                id: 3,
                journal_entry_id: 1,
                kind: MediaKind::Video,
                url: "https://cdn.example.com/c.mp4".to_string(),
            },
        ];
        let prompt = build_prompt(&[e], ReportCategory::DailySummary);
        assert!(prompt.contains("- **附件媒体：** 2个image文件、1个video文件"));
    }

    #[test]
    fn entries_without_media_omit_the_attachment_line() {
        let prompt = build_prompt(&[entry(1, 2024, 2, 1, "记录")], ReportCategory::Progress);
        assert!(!prompt.contains("**附件媒体：**"));
    }

    #[test]
    fn task_header_carries_the_category_tag() {
        let daily = build_prompt(&[], ReportCategory::DailySummary);
        assert!(daily.contains("daily_summary"));
        let suggestions = build_prompt(&[], ReportCategory::Suggestions);
        assert!(suggestions.contains("suggestions"));
    }
}
