//! Record store error types.

use thiserror::Error;

/// Errors that can occur in a record store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with this id already exists
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Remote store rejected the request
    #[error("Store returned {status}: {message}")]
    Service { status: u16, message: String },

    /// Credentials could not be used
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store refused to serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Http(err.to_string())
    }
}
