//! HTTP access to the market-data source.

pub mod client;
pub mod error;

pub use client::{ticker_page_url, validate_address, BoxFuture, HttpClient, SourceClient};
pub use error::{ClientError, ClientResult};
