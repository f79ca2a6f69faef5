//! Prometheus metrics for the ingester.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that must crash at
//! startup. These panics only occur during static initialization.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

/// Pull attempts by endpoint and outcome.
/// Labels: endpoint (global/listing/ticker), outcome (ok/gated/upstream_error/error)
pub static PULLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cmc_pulls_total",
        "Pull attempts by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

/// Incidents written to the durable log.
pub static INCIDENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cmc_incidents_total",
        "Incidents logged by category",
        &["category"]
    )
    .unwrap()
});

/// Snapshots exported.
pub static SNAPSHOTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("cmc_snapshots_total", "Snapshots exported").unwrap()
});

/// Rows in the canonical table.
pub static TABLE_ROWS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("cmc_table_rows", "Rows in the canonical table").unwrap()
});

/// Completed ticker cycles.
pub static TICKER_CYCLES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("cmc_ticker_cycles", "Completed ticker cycles").unwrap()
});

/// Initialization stage (0=awaiting_global .. 3=ready).
pub static INIT_STAGE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("cmc_init_stage", "Initialization stage ordinal").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a pull attempt.
    pub fn pull(endpoint: &str, outcome: &str) {
        PULLS_TOTAL.with_label_values(&[endpoint, outcome]).inc();
    }

    /// Record an incident.
    pub fn incident(category: &str) {
        INCIDENTS_TOTAL.with_label_values(&[category]).inc();
    }

    pub fn snapshot_exported() {
        SNAPSHOTS_TOTAL.inc();
    }

    pub fn table_rows(rows: usize) {
        TABLE_ROWS.set(rows as i64);
    }

    pub fn ticker_cycles(cycles: u64) {
        TICKER_CYCLES.set(cycles as i64);
    }

    pub fn init_stage(ordinal: u8) {
        INIT_STAGE.set(i64::from(ordinal));
    }

    /// Render every registered metric in the text exposition format.
    pub fn render() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
