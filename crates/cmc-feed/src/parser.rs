//! Response parsing for the three source endpoints.
//!
//! Every response is an envelope `{"data": ..., "metadata": {...}}`. A
//! missing, null or empty `data` means the source refused the request and
//! explains why in `metadata`; that is reported as an upstream error rather
//! than a parse failure so the engine can log it in its own category.
//!
//! Parsing is all-or-nothing: one bad row fails the whole page, so a failed
//! pull never reaches the merge step.

use crate::error::{FeedError, FeedResult};
use cmc_core::{AssetRecord, Endpoint};
use serde_json::Value;
use tracing::debug;

/// Field of the global summary that sizes the ticker address space.
pub const ACTIVE_ASSETS_FIELD: &str = "active_cryptocurrencies";

/// Parsed global summary.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSummary {
    /// Number of active assets, i.e. the highest ticker offset.
    pub active_assets: u32,
    /// The full `data` payload, for logging.
    pub raw: Value,
}

/// Unwrap the `data` payload of a response envelope.
pub fn extract_data(endpoint: Endpoint, doc: Value) -> FeedResult<Value> {
    let Value::Object(mut envelope) = doc else {
        return Err(FeedError::InvalidData {
            endpoint,
            reason: "response is not a JSON object".to_string(),
        });
    };

    let data = envelope.remove("data").unwrap_or(Value::Null);
    if is_empty_payload(&data) {
        let metadata = envelope
            .get("metadata")
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string());
        return Err(FeedError::UpstreamResponse { endpoint, metadata });
    }

    Ok(data)
}

/// Parse the global endpoint response.
pub fn parse_global(doc: Value) -> FeedResult<GlobalSummary> {
    let data = extract_data(Endpoint::Global, doc)?;

    let active = data
        .get(ACTIVE_ASSETS_FIELD)
        .and_then(Value::as_u64)
        .ok_or_else(|| FeedError::InvalidData {
            endpoint: Endpoint::Global,
            reason: format!("missing or non-integer `{ACTIVE_ASSETS_FIELD}`"),
        })?;

    let active_assets = u32::try_from(active).map_err(|_| FeedError::InvalidData {
        endpoint: Endpoint::Global,
        reason: format!("`{ACTIVE_ASSETS_FIELD}` out of range: {active}"),
    })?;

    Ok(GlobalSummary {
        active_assets,
        raw: data,
    })
}

/// Parse the listing endpoint response.
pub fn parse_listing(doc: Value) -> FeedResult<Vec<AssetRecord>> {
    let data = extract_data(Endpoint::Listing, doc)?;
    parse_rows(Endpoint::Listing, data)
}

/// Parse one ticker page.
///
/// Accepts both the array structure and the object-keyed-by-id structure.
pub fn parse_ticker(doc: Value) -> FeedResult<Vec<AssetRecord>> {
    let data = extract_data(Endpoint::Ticker, doc)?;
    parse_rows(Endpoint::Ticker, data)
}

fn parse_rows(endpoint: Endpoint, data: Value) -> FeedResult<Vec<AssetRecord>> {
    let rows: Vec<Value> = match data {
        Value::Array(rows) => rows,
        Value::Object(map) => map.into_iter().map(|(_, row)| row).collect(),
        other => {
            return Err(FeedError::InvalidData {
                endpoint,
                reason: format!("expected array or object of rows, got {other}"),
            })
        }
    };

    let records = rows
        .iter()
        .map(AssetRecord::from_json_row)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(%endpoint, rows = records.len(), "Parsed response rows");
    Ok(records)
}

fn is_empty_payload(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
