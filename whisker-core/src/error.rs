//! Core error types for Whisker.

use thiserror::Error;

/// Core error type for Whisker model operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A persisted record line could not be decoded.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
