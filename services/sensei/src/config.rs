//! services/sensei/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub assistant_api_base: String,
    pub assistant_model: String,
    pub assistant_timeout: Duration,
    /// How long an action waits for the user to answer the API key prompt.
    pub api_key_prompt_timeout: Duration,
    pub media_root: PathBuf,
    pub secrets_path: PathBuf,
    pub mood_tick: Duration,
    /// Seed for pose selection; `None` draws from OS entropy.
    pub pose_seed: Option<u64>,
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

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3917".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Assistant Settings ---
        let assistant_api_base = std::env::var("ASSISTANT_API_BASE")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        let assistant_model = std::env::var("ASSISTANT_MODEL")
            .unwrap_or_else(|_| "tngtech/deepseek-r1t2-chimera:free".to_string());
        let assistant_timeout = Duration::from_secs(parse_var("ASSISTANT_TIMEOUT_SECS", 60)?);
        let api_key_prompt_timeout =
            Duration::from_secs(parse_var("API_KEY_PROMPT_TIMEOUT_SECS", 120)?);

        // --- Load Paths and Timing ---
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media/default_skin"));
        let secrets_path = std::env::var("SECRETS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.sensei/secrets.json"));
        let mood_tick = Duration::from_millis(parse_var("MOOD_TICK_MS", 2000)?);
        if mood_tick.is_zero() {
            return Err(ConfigError::InvalidValue(
                "MOOD_TICK_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let pose_seed = match std::env::var("POSE_SEED") {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("POSE_SEED".to_string(), e.to_string())
            })?),
            Err(_) => None,
        };

        Ok(Self {
            bind_address,
            log_level,
            assistant_api_base,
            assistant_model,
            assistant_timeout,
            api_key_prompt_timeout,
            media_root,
            secrets_path,
            mood_tick,
            pose_seed,
        })
    }
}

/// Reads an optional numeric variable, falling back to `default` when unset.
fn parse_var(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
