//! Embedding error types.

use thiserror::Error;

/// Errors that can occur while loading an embedding model.
///
/// Token lookups never fail: an unknown token is a `None`, not an error.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Model file not found
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed model contents
    #[error("Invalid model at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Rows disagree on vector length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Model holds no vectors
    #[error("Model is empty: {0}")]
    Empty(String),
}
