//! Market-data ingester.
//!
//! Pulls a global summary, a full asset listing and a paginated ticker from a
//! rate-limited source, consolidates them into one table keyed by asset id,
//! and exports that table as a CSV snapshot once per full ticker cycle.

pub mod app;
pub mod config;
pub mod error;
pub mod snapshot;

pub use app::IngestionEngine;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use snapshot::PersistenceTrigger;
