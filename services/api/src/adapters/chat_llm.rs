//! services/api/src/adapters/chat_llm.rs
//!
//! The remote generation backend: a single chat-completions request to an
//! OpenAI-compatible provider. One call, one configured deadline, no
//! retries - a failed call surfaces immediately and is never papered over
//! with mock content.

use async_trait::async_trait;
use healing_companion_core::ports::{GenerationError, ReportGenerator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiConfig;

/// System message sent alongside every built prompt.
const SYSTEM_MESSAGE: &str = "你是一位专业的儿童康复治疗师和心理健康专家，拥有丰富的儿童发展和康复治疗经验。你需要基于提供的疗愈记录数据，生成专业、详细且具有指导意义的分析报告。请确保报告内容专业准确，语言清晰易懂，建议具体可操作。";

/// Error bodies beyond this length are truncated before being embedded in
/// a transport error.
const MAX_ERROR_BODY: usize = 2048;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

//=========================================================================================
// The Adapter
//=========================================================================================

/// A generation backend talking to `{base_url}/chat/completions`.
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionsGenerator {
    /// Builds the adapter from the AI configuration. The request deadline
    /// is enforced at the HTTP-client level.
    pub fn from_config(ai: &AiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(ai.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: ai.base_url.trim_end_matches('/').to_string(),
            api_key: ai.api_key.clone().unwrap_or_default(),
            model: ai.model.clone(),
            max_tokens: ai.max_tokens,
            temperature: ai.temperature,
        })
    }

    fn unwrap_body(status: reqwest::StatusCode, body: &str) -> Result<String, GenerationError> {
        // A structured provider error wins over the raw status so the
        // provider's own message reaches the caller.
        if let Ok(parsed) = serde_json::from_str::<ChatResponse>(body) {
            if let Some(err) = parsed.error {
                if !err.message.is_empty() {
                    return Err(GenerationError::Provider {
                        message: err.message,
                        kind: err.kind,
                    });
                }
            }

            if status.is_success() {
                let content = match parsed.choices.into_iter().next() {
                    Some(choice) => choice.message.content,
                    None => return Err(GenerationError::EmptyResponse),
                };
                if content.trim().is_empty() {
                    return Err(GenerationError::EmptyContent);
                }
                return Ok(content);
            }
        }

        Err(GenerationError::Transport(format!(
            "HTTP {}: {}",
            status,
            truncate(body, MAX_ERROR_BODY)
        )))
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl ReportGenerator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, "Sending chat-completions request");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Self::unwrap_body(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn adapter_for(server: &mockito::ServerGuard) -> ChatCompletionsGenerator {
        let ai = AiConfig {
            base_url: server.url(),
            api_key: Some("sk-test".to_string()),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
        };
        ChatCompletionsGenerator::from_config(&ai).unwrap()
    }

    #[tokio::test]
    async fn extracts_the_first_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(
                r##"{"choices":[{"message":{"role":"assistant","content":"# 报告正文"}}]}"##,
            )
            .create_async()
            .await;

        let content = adapter_for(&server).generate("测试提示词").await.unwrap();
        assert_eq!(content, "# 报告正文");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn provider_error_body_is_surfaced_even_on_http_500() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body(r#"{"error":{"message":"rate limited","type":"rate_limit"}}"#)
            .create_async()
            .await;

        let err = adapter_for(&server).generate("prompt").await.unwrap_err();
        match err {
            GenerationError::Provider { message, kind } => {
                assert_eq!(message, "rate limited");
                assert_eq!(kind, "rate_limit");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_2xx_without_structured_error_is_a_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = adapter_for(&server).generate("prompt").await.unwrap_err();
        match err {
            GenerationError::Transport(detail) => {
                assert!(detail.contains("502"));
                assert!(detail.contains("bad gateway"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_completions_is_an_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = adapter_for(&server).generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn blank_completion_text_is_empty_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#)
            .create_async()
            .await;

        let err = adapter_for(&server).generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyContent));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY * 2);
        let err =
            ChatCompletionsGenerator::unwrap_body(reqwest::StatusCode::BAD_GATEWAY, &body)
                .unwrap_err();
        match err {
            GenerationError::Transport(detail) => {
                assert!(detail.len() < body.len());
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
