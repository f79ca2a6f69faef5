//! Source endpoint identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three endpoints the ingester pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Market-wide summary; carries the active asset count.
    Global,
    /// Full id/name/symbol/slug listing.
    Listing,
    /// Paginated per-asset market data.
    Ticker,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Global => "global",
            Endpoint::Listing => "listing",
            Endpoint::Ticker => "ticker",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
