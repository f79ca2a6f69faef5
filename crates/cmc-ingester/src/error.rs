//! Application error types.

use cmc_persistence::IncidentCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(#[from] cmc_client::ClientError),

    #[error("Feed error: {0}")]
    Feed(#[from] cmc_feed::FeedError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] cmc_persistence::PersistenceError),

    #[error("Shutdown requested")]
    Shutdown,
}

impl AppError {
    /// Whether the source itself refused the request.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Feed(e) if e.is_upstream())
    }

    /// Incident log this error belongs in.
    pub fn category(&self) -> IncidentCategory {
        if self.is_upstream() {
            IncidentCategory::ApiError
        } else {
            IncidentCategory::Error
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
