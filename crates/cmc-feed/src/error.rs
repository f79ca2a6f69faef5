//! Feed error types.

use cmc_core::{CoreError, Endpoint};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The source answered without a `data` payload. `metadata` is the
    /// source's own diagnostic block, serialized verbatim.
    #[error("Upstream response error from {endpoint}: {metadata}")]
    UpstreamResponse { endpoint: Endpoint, metadata: String },

    #[error("Invalid data from {endpoint}: {reason}")]
    InvalidData { endpoint: Endpoint, reason: String },

    #[error("Record error: {0}")]
    Record(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// Whether this error came from the source's own error reporting.
    pub fn is_upstream(&self) -> bool {
        matches!(self, FeedError::UpstreamResponse { .. })
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
