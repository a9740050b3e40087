//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// The value shipped in `.env` templates; treated the same as no key at all.
pub const API_KEY_PLACEHOLDER: &str = "your-api-key-here";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// Constructed once in `main` and shared immutably through `AppState`;
/// handlers never reach back into the process environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub static_dir: PathBuf,
    pub secret_key: String,
    pub openai_api_key: Option<String>,
    pub plan_model: String,
    pub plan_temperature: f32,
    pub plan_max_tokens: u32,
    pub plan_timeout_secs: u64,
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
            .unwrap_or_else(|_| "sqlite:study_tracker.db".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let secret_key = std::env::var("SECRET_KEY")
            .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string());

        // --- Load API Key (as optional; checked per request, not at startup) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Plan-Generation Settings ---
        let plan_model =
            std::env::var("PLAN_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let plan_temperature = parse_var("PLAN_TEMPERATURE", 0.7f32)?;
        let plan_max_tokens = parse_var("PLAN_MAX_TOKENS", 2048u32)?;
        let plan_timeout_secs = parse_var("PLAN_TIMEOUT_SECS", 60u64)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            static_dir,
            secret_key,
            openai_api_key,
            plan_model,
            plan_temperature,
            plan_max_tokens,
            plan_timeout_secs,
        })
    }

    /// True when a usable API credential is configured. A missing key and the
    /// well-known placeholder value are equivalent.
    pub fn has_api_key(&self) -> bool {
        match self.openai_api_key.as_deref() {
            Some(key) => !key.is_empty() && key != API_KEY_PLACEHOLDER,
            None => false,
        }
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
