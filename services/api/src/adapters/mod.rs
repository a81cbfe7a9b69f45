//! services/api/src/adapters/mod.rs
//!
//! Concrete implementations of the core crate's ports.

use std::sync::Arc;

use healing_companion_core::ports::ReportGenerator;
use tracing::info;

use crate::config::AiConfig;
use crate::error::ApiError;

pub mod chat_llm;
pub mod db;
pub mod mock_llm;

pub use chat_llm::ChatCompletionsGenerator;
pub use db::DbAdapter;
pub use mock_llm::MockGenerator;

/// Resolves the generation backend from configuration: the deterministic
/// mock when no usable API key is present, the remote chat-completions
/// adapter otherwise.
pub fn generator_from_config(ai: &AiConfig) -> Result<Arc<dyn ReportGenerator>, ApiError> {
    if ai.is_mock_mode() {
        info!("No AI provider credential configured; using the deterministic mock backend");
        return Ok(Arc::new(MockGenerator::new()));
    }

    info!(base_url = %ai.base_url, model = %ai.model, "Using the remote chat-completions backend");
    let generator = ChatCompletionsGenerator::from_config(ai)
        .map_err(|e| ApiError::Internal(format!("failed to build the HTTP client: {}", e)))?;
    Ok(Arc::new(generator))
}
