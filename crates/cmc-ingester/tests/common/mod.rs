//! Scripted collaborators for engine scenarios.
//!
//! - `ScriptedClient`: canned JSON documents per URL, records every request
//! - `RecordingPersistor`: keeps a summary of each exported snapshot
//! - `RecordingSink`: keeps every incident entry
//! - `Harness`: an engine wired to the above and a manual clock

#![allow(dead_code)]

use cmc_client::{ticker_page_url, BoxFuture, ClientError, ClientResult, HttpClient};
use cmc_core::{CanonicalTable, ManualClock};
use cmc_ingester::{AppConfig, IngestionEngine};
use cmc_persistence::{
    IncidentCategory, IncidentEntry, IncidentSink, PersistenceError, PersistenceResult, Persistor,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

pub const GLOBAL_URL: &str = "https://example.com/v2/global/";
pub const LISTING_URL: &str = "https://example.com/v2/listings/";
pub const TICKER_BASE: &str = "https://example.com/v2/ticker/";

/// Spacing between harness ticks; just over the minimum pull interval.
pub const TICK: Duration = Duration::from_secs(11);

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.api.pull_frequency_minimum_interval = 10;
    config.api.timeout = 5;
    config.api.error_timeout = 60;
    config.api.global.address = GLOBAL_URL.to_string();
    config.api.listing.address = LISTING_URL.to_string();
    config.api.listing.pull_frequency = 3600;
    config.api.ticker.address = TICKER_BASE.to_string();
    config.api.ticker.page_length = 100;
    config.api.ticker.refresh_period = 300;
    config
}

pub fn ticker_url(start: u32) -> String {
    ticker_page_url(TICKER_BASE, start, 100).unwrap()
}

fn envelope(data: Value) -> Value {
    json!({
        "data": data,
        "metadata": { "timestamp": 1_530_000_000, "error": null }
    })
}

pub fn global_doc(active: u32) -> Value {
    envelope(json!({
        "active_cryptocurrencies": active,
        "active_markets": 11_000,
        "quotes": { "USD": { "total_market_cap": 250_000_000_000.0 } }
    }))
}

pub fn listing_doc(ids: impl IntoIterator<Item = u64>) -> Value {
    let rows: Vec<Value> = ids
        .into_iter()
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Asset {id}"),
                "symbol": format!("A{id}"),
                "website_slug": format!("asset-{id}")
            })
        })
        .collect();
    envelope(Value::Array(rows))
}

pub fn ticker_doc(ids: impl IntoIterator<Item = u64>, price_factor: f64) -> Value {
    let rows: Vec<Value> = ids
        .into_iter()
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Asset {id}"),
                "symbol": format!("A{id}"),
                "website_slug": format!("asset-{id}"),
                "rank": id,
                "quotes": { "USD": { "price": id as f64 * price_factor, "volume_24h": 1000.0 } }
            })
        })
        .collect();
    envelope(Value::Array(rows))
}

/// Response with no payload, the way the source refuses a request.
pub fn refusal_doc(reason: &str) -> Value {
    json!({
        "data": null,
        "metadata": { "timestamp": 1_530_000_000, "error": reason }
    })
}

pub enum Reply {
    Doc(Value),
    Fail(String),
}

/// HTTP client answering from per-URL scripts.
///
/// Queued replies are consumed first; after that a URL's standing reply, if
/// any, is returned on every request.
#[derive(Default)]
pub struct ScriptedClient {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    standing: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: impl Into<String>, reply: Reply) {
        self.queued
            .lock()
            .entry(url.into())
            .or_default()
            .push_back(reply);
    }

    pub fn always(&self, url: impl Into<String>, doc: Value) {
        self.standing.lock().insert(url.into(), doc);
    }

    /// Standing replies for a complete 250-asset source.
    pub fn script_source_250(&self) {
        self.always(GLOBAL_URL, global_doc(250));
        self.always(LISTING_URL, listing_doc(1..=250));
        self.always(ticker_url(1), ticker_doc(1..=100, 1.0));
        self.always(ticker_url(101), ticker_doc(101..=200, 1.0));
        self.always(ticker_url(201), ticker_doc(201..=250, 1.0));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn answer(&self, url: &str) -> ClientResult<Value> {
        self.requests.lock().push(url.to_string());

        let queued = self.queued.lock().get_mut(url).and_then(VecDeque::pop_front);
        match queued {
            Some(Reply::Doc(doc)) => Ok(doc),
            Some(Reply::Fail(reason)) => Err(ClientError::HttpClient(reason)),
            None => self
                .standing
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| ClientError::HttpClient(format!("no scripted reply for {url}"))),
        }
    }
}

impl HttpClient for ScriptedClient {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<Value>> {
        let reply = self.answer(url);
        Box::pin(async move { reply })
    }
}

/// Summary of one exported snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub name: String,
    pub table: CanonicalTable,
}

#[derive(Default)]
pub struct RecordingPersistor {
    snapshots: Mutex<Vec<SnapshotRecord>>,
    failing: bool,
}

impl RecordingPersistor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn snapshots(&self) -> Vec<SnapshotRecord> {
        self.snapshots.lock().clone()
    }
}

impl Persistor for RecordingPersistor {
    fn persist(&self, name: &str, table: &CanonicalTable) -> PersistenceResult<usize> {
        if self.failing {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "bucket unavailable",
            )));
        }
        self.snapshots.lock().push(SnapshotRecord {
            name: name.to_string(),
            table: table.clone(),
        });
        Ok(table.len())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(IncidentCategory, IncidentEntry)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, category: IncidentCategory) -> Vec<IncidentEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl IncidentSink for RecordingSink {
    fn log(&self, entry: &IncidentEntry, category: IncidentCategory) -> PersistenceResult<()> {
        self.entries.lock().push((category, entry.clone()));
        Ok(())
    }
}

/// Engine plus handles on all of its collaborators.
pub struct Harness {
    pub engine: IngestionEngine,
    pub client: Arc<ScriptedClient>,
    pub persistor: Arc<RecordingPersistor>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(config: AppConfig) -> Self {
        Self::with_persistor(config, RecordingPersistor::new())
    }

    pub fn with_persistor(config: AppConfig, persistor: RecordingPersistor) -> Self {
        let client = Arc::new(ScriptedClient::new());
        let persistor = Arc::new(persistor);
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::at_epoch());

        let engine = IngestionEngine::new(
            config,
            client.clone(),
            persistor.clone(),
            sink.clone(),
            clock.clone(),
        );

        Self {
            engine,
            client,
            persistor,
            sink,
            clock,
        }
    }

    /// Advance the clock by one tick and run one iteration.
    pub async fn tick(&mut self) -> Duration {
        self.clock.advance(TICK);
        self.engine.step().await
    }

    /// Seconds since the harness started.
    pub fn elapsed_secs(&self) -> i64 {
        use cmc_core::Clock;
        (self.clock.now() - chrono::DateTime::<chrono::Utc>::default()).num_seconds()
    }
}
