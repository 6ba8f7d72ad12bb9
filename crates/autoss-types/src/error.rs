//! Error types shared across the autoss crates.

use thiserror::Error;

/// Errors raised while building shared domain values or loading settings.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for TypesError {
    fn from(err: config::ConfigError) -> Self {
        TypesError::Config(err.to_string())
    }
}
