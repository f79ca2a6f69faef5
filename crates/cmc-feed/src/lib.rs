//! Response parsing and table reconciliation.
//!
//! Turns raw endpoint responses into `AssetRecord`s and merges them into
//! the `CanonicalTable` with the per-source join rules.

pub mod error;
pub mod merge;
pub mod parser;

pub use error::{FeedError, FeedResult};
pub use merge::{MergeEngine, MergeOutcome};
pub use parser::{
    extract_data, parse_global, parse_listing, parse_ticker, GlobalSummary, ACTIVE_ASSETS_FIELD,
};
