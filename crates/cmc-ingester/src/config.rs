//! Application configuration.

use crate::error::{AppError, AppResult};
use cmc_persistence::BlobStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Global summary or listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Absolute URL of the endpoint.
    pub address: String,
    /// Seconds after which the last successful pull counts as stale. Only
    /// the listing is refreshed this way; the summary is pulled at startup.
    pub pull_frequency: u64,
}

impl EndpointConfig {
    pub fn pull_frequency(&self) -> Duration {
        Duration::from_secs(self.pull_frequency)
    }
}

/// Paginated ticker endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerConfig {
    pub address: String,
    /// Rows per page; also the spacing between page offsets.
    #[serde(default = "default_page_length")]
    pub page_length: u32,
    /// Seconds to hold off after a full-cycle snapshot.
    #[serde(default = "default_refresh_period")]
    pub refresh_period: u64,
}

fn default_page_length() -> u32 {
    100
}

fn default_refresh_period() -> u64 {
    300
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            address: "https://api.coinmarketcap.com/v2/ticker/".to_string(),
            page_length: default_page_length(),
            refresh_period: default_refresh_period(),
        }
    }
}

/// Source API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Minimum spacing between any two requests (seconds).
    #[serde(default = "default_min_interval")]
    pub pull_frequency_minimum_interval: u64,
    /// Sleep between loop iterations (seconds).
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Sleep after a failed iteration (seconds).
    #[serde(default = "default_error_timeout")]
    pub error_timeout: u64,

    #[serde(default = "default_global")]
    pub global: EndpointConfig,
    #[serde(default = "default_listing", alias = "listings")]
    pub listing: EndpointConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
}

fn default_min_interval() -> u64 {
    10
}

fn default_timeout() -> u64 {
    5
}

fn default_error_timeout() -> u64 {
    60
}

fn default_global() -> EndpointConfig {
    EndpointConfig {
        address: "https://api.coinmarketcap.com/v2/global/".to_string(),
        pull_frequency: 300,
    }
}

fn default_listing() -> EndpointConfig {
    EndpointConfig {
        address: "https://api.coinmarketcap.com/v2/listings/".to_string(),
        pull_frequency: 3600,
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            pull_frequency_minimum_interval: default_min_interval(),
            timeout: default_timeout(),
            error_timeout: default_error_timeout(),
            global: default_global(),
            listing: default_listing(),
            ticker: TickerConfig::default(),
        }
    }
}

/// Snapshot and incident storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Object name of the snapshot.
    #[serde(default = "default_filename")]
    pub filename: String,
    /// Directory hosting buckets.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    /// Local directory for files before upload.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
}

fn default_bucket() -> String {
    "market-snapshots".to_string()
}

fn default_filename() -> String {
    "currencies.csv".to_string()
}

fn default_root_dir() -> String {
    "./data/buckets".to_string()
}

fn default_staging_dir() -> String {
    "./data/staging".to_string()
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            filename: default_filename(),
            root_dir: default_root_dir(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub persist: PersistConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from an object in the blob store.
    pub fn from_blob(store: &dyn BlobStore, name: &str) -> AppResult<Self> {
        let bytes = store.read(name)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| AppError::Config(format!("Config blob {name} is not UTF-8: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api.ticker.page_length == 0 {
            return Err(AppError::Config(
                "api.ticker.page_length must be positive".to_string(),
            ));
        }

        for (section, address) in [
            ("api.global", &self.api.global.address),
            ("api.listing", &self.api.listing.address),
            ("api.ticker", &self.api.ticker.address),
        ] {
            cmc_client::validate_address(address)
                .map_err(|e| AppError::Config(format!("{section}.address: {e}")))?;
        }

        if self.persist.filename.is_empty() {
            return Err(AppError::Config("persist.filename is empty".to_string()));
        }

        Ok(())
    }

    pub fn min_pull_interval(&self) -> Duration {
        Duration::from_secs(self.api.pull_frequency_minimum_interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout)
    }

    pub fn error_timeout(&self) -> Duration {
        Duration::from_secs(self.api.error_timeout)
    }

    /// Cool-down after a snapshot; the ticker refresh period.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.api.ticker.refresh_period)
    }
}
