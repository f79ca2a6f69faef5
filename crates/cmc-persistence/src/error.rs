//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Blob not found: {bucket}/{name}")]
    NotFound { bucket: String, name: String },

    #[error("Invalid blob name: {0}")]
    InvalidName(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
