//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

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
    pub log_level: Level,
    pub frontend_origin: String,
    /// Which card-generation backend to use: `openai`, `gemini`, or `claude`.
    pub llm_provider: String,
    pub openai_api_key: Option<String>,
    /// Override for OpenAI-compatible endpoints (self-hosted gateways etc.).
    pub openai_api_base: Option<String>,
    pub cards_model: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let frontend_origin = std::env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load LLM Provider Settings ---
        let llm_provider =
            std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let openai_api_base = std::env::var("OPENAI_API_BASE").ok();
        let cards_model =
            std::env::var("CARDS_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            frontend_origin,
            llm_provider,
            openai_api_key,
            openai_api_base,
            cards_model,
        })
    }
}
