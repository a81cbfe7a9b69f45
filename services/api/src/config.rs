//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;

/// Sentinel left behind by config templates; treated the same as an
/// absent API key, i.e. the deterministic mock generator is selected.
pub const PLACEHOLDER_API_KEY: &str = "your_ai_api_key_here";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    /// Raw `RUST_LOG` directive string, handed to `EnvFilter` unparsed so
    /// per-target directives like `api=debug,sqlx=warn` work.
    pub log_filter: String,
    pub ai: AiConfig,
}

/// Parameters governing the generation backend.
#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl AiConfig {
    /// True when no usable provider credential is configured, which
    /// selects the local deterministic generator.
    pub fn is_mock_mode(&self) -> bool {
        match self.api_key.as_deref() {
            None | Some("") | Some(PLACEHOLDER_API_KEY) => true,
            Some(_) => false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure
    /// tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let ai = AiConfig {
            base_url: std::env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("AI_API_KEY").ok(),
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_tokens: parse_var("AI_MAX_TOKENS", 2000)?,
            temperature: parse_var("AI_TEMPERATURE", 0.7)?,
            timeout: Duration::from_secs(parse_var("AI_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            bind_address,
            database_url,
            log_filter,
            ai,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}
