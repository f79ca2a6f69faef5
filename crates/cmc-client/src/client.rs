//! HTTP client for the market-data source.
//!
//! The ingester only ever issues plain GETs and expects a JSON document
//! back. `HttpClient` is the seam the engine depends on; `SourceClient` is
//! the reqwest-backed implementation.

use crate::error::{ClientError, ClientResult};
use reqwest::{Client, Url};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for fetching JSON documents.
///
/// Implementations must not retry internally: the engine owns the pacing
/// and every attempt has to pass its pull gate.
pub trait HttpClient: Send + Sync {
    /// GET `url` and decode the body as JSON.
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<Value>>;
}

/// reqwest-backed client.
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    /// Create a client with the default request timeout.
    pub fn new() -> ClientResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cmc-ingester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> ClientResult<Value> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::HttpClient(format!("Failed to read body: {e}")))?;

        // The source reports refusals (rate limits, bad params) as JSON with
        // a `metadata` block and a 4xx status. Hand those back as documents so
        // they are classified as upstream errors, not transport failures.
        match serde_json::from_str::<Value>(&body) {
            Ok(doc) if status.is_success() || doc.get("metadata").is_some() => {
                if !status.is_success() {
                    warn!(%url, %status, "Source returned error status with metadata");
                }
                Ok(doc)
            }
            Ok(_) => Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            }),
            Err(e) if status.is_success() => Err(ClientError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            }),
        }
    }
}

impl HttpClient for SourceClient {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<Value>> {
        Box::pin(self.fetch(url))
    }
}

/// Build the ticker page URL for offset `start`.
///
/// Any query already present on `base` is replaced.
pub fn ticker_page_url(base: &str, start: u32, limit: u32) -> ClientResult<String> {
    let mut url =
        Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("start", &start.to_string())
        .append_pair("limit", &limit.to_string())
        .append_pair("sort", "id")
        .append_pair("structure", "array");
    Ok(url.into())
}

/// Check that an endpoint address parses as an absolute URL.
pub fn validate_address(address: &str) -> ClientResult<()> {
    Url::parse(address)
        .map(|_| ())
        .map_err(|e| ClientError::InvalidUrl(format!("{address}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_page_url() {
        let url = ticker_page_url("https://api.coinmarketcap.com/v2/ticker/", 101, 100).unwrap();
        assert_eq!(
            url,
            "https://api.coinmarketcap.com/v2/ticker/?start=101&limit=100&sort=id&structure=array"
        );
    }

    #[test]
    fn test_ticker_page_url_replaces_existing_query() {
        let url = ticker_page_url("https://example.com/ticker?convert=EUR", 1, 50).unwrap();
        assert_eq!(
            url,
            "https://example.com/ticker?start=1&limit=50&sort=id&structure=array"
        );
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            ticker_page_url("not a url", 1, 100),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(validate_address("https://example.com/global/").is_ok());
    }
}
