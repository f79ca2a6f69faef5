//! Core domain types for the market-data ingester.
//!
//! This crate provides the types shared by every stage of ingestion:
//! - `AssetRecord`, `AssetId`, `NaturalKey`: one asset row and its identities
//! - `CanonicalTable`: the consolidated table keyed by asset id
//! - `Endpoint`: which source endpoint a pull targets
//! - `Clock`: injectable time source

pub mod clock;
pub mod endpoint;
pub mod error;
pub mod record;
pub mod table;

pub use clock::{to_chrono, Clock, ManualClock, SystemClock};
pub use endpoint::Endpoint;
pub use error::{CoreError, Result};
pub use record::{AssetId, AssetRecord, NaturalKey, KEY_COLUMNS};
pub use table::CanonicalTable;
