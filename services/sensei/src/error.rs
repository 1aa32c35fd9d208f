//! services/sensei/src/error.rs
//!
//! Defines the error type that can end the sensei process.

use crate::config::ConfigError;

/// Failures that stop the service before or while it serves.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment did not describe a usable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
