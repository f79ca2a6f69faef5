//! Error types for cmc-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Missing field `{field}` in record {context}")]
    MissingField { field: &'static str, context: String },

    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
