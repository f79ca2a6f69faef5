//! Ingestion loop.
//!
//! Drives the three source endpoints through one shared pull gate:
//! - Initialization: global summary, then listing, then one full ticker
//!   cycle, strictly in that order.
//! - Steady state: a listing refresh when the listing is stale, then the
//!   next ticker page.
//! - After every ticker attempt: a snapshot once per completed cycle,
//!   followed by a cool-down window.
//!
//! Failures never leave the loop. Each one is logged to the incident log of
//! its category and the next sleep is the error backoff.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::snapshot::PersistenceTrigger;
use chrono::{DateTime, Utc};
use cmc_client::{ticker_page_url, HttpClient, SourceClient};
use cmc_core::{to_chrono, CanonicalTable, Clock, Endpoint, SystemClock};
use cmc_feed::{parse_global, parse_listing, parse_ticker, GlobalSummary, MergeEngine};
use cmc_persistence::{
    BlobStore, CsvPersistor, DirBlobStore, IncidentCategory, IncidentEntry, IncidentLog,
    IncidentSink, Persistor,
};
use cmc_schedule::{InitStage, PageCursor, PullGate};
use cmc_telemetry::Metrics;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Main ingestion engine.
pub struct IngestionEngine {
    config: AppConfig,
    client: Arc<dyn HttpClient>,
    persistor: Arc<dyn Persistor>,
    incidents: Arc<dyn IncidentSink>,
    clock: Arc<dyn Clock>,

    table: CanonicalTable,
    merge: MergeEngine,
    stage: InitStage,
    cursor: PageCursor,
    gate: PullGate,
    trigger: PersistenceTrigger,
    last_listing_update: DateTime<Utc>,
    snapshots: u64,
}

impl IngestionEngine {
    /// Create an engine over explicit collaborators.
    ///
    /// The first pull becomes allowed one minimum interval after this call.
    pub fn new(
        config: AppConfig,
        client: Arc<dyn HttpClient>,
        persistor: Arc<dyn Persistor>,
        incidents: Arc<dyn IncidentSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        let gate = PullGate::new(
            now,
            to_chrono(config.min_pull_interval()),
            to_chrono(config.cooldown()),
        );
        let cursor = PageCursor::new(config.api.ticker.page_length);

        Self {
            config,
            client,
            persistor,
            incidents,
            clock,
            table: CanonicalTable::new(),
            merge: MergeEngine::new(),
            stage: InitStage::default(),
            cursor,
            gate,
            trigger: PersistenceTrigger::new(),
            last_listing_update: now,
            snapshots: 0,
        }
    }

    /// Create an engine with the production collaborators: the reqwest
    /// client, a directory-backed bucket for snapshots and incident logs,
    /// and the system clock.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let store: Arc<dyn BlobStore> = Arc::new(DirBlobStore::open(
            &config.persist.root_dir,
            config.persist.bucket.clone(),
        )?);
        let persistor = Arc::new(CsvPersistor::new(
            store.clone(),
            &config.persist.staging_dir,
        ));
        let incidents = Arc::new(IncidentLog::new(store, &config.persist.staging_dir));
        let client = Arc::new(SourceClient::new()?);

        info!(
            root_dir = %config.persist.root_dir,
            bucket = %config.persist.bucket,
            "Storage opened"
        );

        Ok(Self::new(
            config,
            client,
            persistor,
            incidents,
            Arc::new(SystemClock),
        ))
    }

    pub fn table(&self) -> &CanonicalTable {
        &self.table
    }

    pub fn stage(&self) -> InitStage {
        self.stage
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn gate(&self) -> &PullGate {
        &self.gate
    }

    /// Snapshots exported since construction.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between iterations and during sleeps; a
    /// request already in flight completes first.
    pub async fn run(mut self, shutdown: CancellationToken) -> AppResult<()> {
        info!(
            page_length = self.cursor.page_length(),
            min_interval_secs = self.config.api.pull_frequency_minimum_interval,
            "Entering ingestion loop"
        );

        while !shutdown.is_cancelled() {
            let pause = self.step().await;
            debug!(pause_secs = pause.as_secs(), stage = %self.stage, "Sleeping");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.record_shutdown();
        Ok(())
    }

    /// One loop iteration. Returns how long to sleep before the next one.
    pub async fn step(&mut self) -> Duration {
        let result = if self.stage.is_ready() {
            self.refresh().await
        } else {
            self.initialize().await
        };

        Metrics::init_stage(self.stage.ordinal());
        Metrics::table_rows(self.table.len());

        match result {
            Ok(()) => self.config.timeout(),
            Err(e) => {
                self.report(&e);
                self.config.error_timeout()
            }
        }
    }

    async fn initialize(&mut self) -> AppResult<()> {
        if !self.stage.global_done() {
            if self.update_global().await? {
                self.stage.on_global_success();
                info!(stage = %self.stage, "Global summary initialized");
            }
        } else if !self.stage.listing_done() {
            if self.update_listing(true).await? {
                self.stage.on_listing_success();
                info!(stage = %self.stage, rows = self.table.len(), "Listing initialized");
            }
        } else {
            self.ticker_attempt().await?;
            if self.cursor.completed_full_cycle() {
                self.stage.on_ticker_cycle_complete();
                info!(
                    stage = %self.stage,
                    rows = self.table.len(),
                    columns = self.table.columns().len(),
                    "Ticker cycle complete, ingester ready"
                );
            }
        }
        Ok(())
    }

    async fn refresh(&mut self) -> AppResult<()> {
        self.update_listing(false).await?;
        self.ticker_attempt().await
    }

    /// Pull the global summary if the gate allows. Only needed until the
    /// ticker address space is known. Returns whether a pull succeeded.
    async fn update_global(&mut self) -> AppResult<bool> {
        let now = self.clock.now();
        if !self.gate.is_pull_allowed(now) {
            Metrics::pull(Endpoint::Global.as_str(), "gated");
            return Ok(false);
        }

        let address = self.config.api.global.address.clone();
        self.gate.record_pull(now);
        let summary = observe(Endpoint::Global, self.fetch_global(&address).await)?;

        self.cursor.set_max_page(summary.active_assets);
        info!(active_assets = summary.active_assets, "Global summary pulled");
        Ok(true)
    }

    async fn fetch_global(&self, address: &str) -> AppResult<GlobalSummary> {
        let doc = self.client.get_json(address).await?;
        Ok(parse_global(doc)?)
    }

    /// Pull the listing if stale (or `force`) and the gate allows.
    /// Returns whether a pull succeeded.
    async fn update_listing(&mut self, force: bool) -> AppResult<bool> {
        let now = self.clock.now();
        let stale =
            now - self.last_listing_update > to_chrono(self.config.api.listing.pull_frequency());
        if !(force || stale) {
            return Ok(false);
        }
        if !self.gate.is_pull_allowed(now) {
            Metrics::pull(Endpoint::Listing.as_str(), "gated");
            return Ok(false);
        }

        let address = self.config.api.listing.address.clone();
        self.gate.record_pull(now);
        let fetched = self.fetch(&address).await;
        let listing = observe(
            Endpoint::Listing,
            fetched.and_then(|doc| parse_listing(doc).map_err(AppError::from)),
        )?;

        let outcome = self.merge.merge_listing(&mut self.table, listing);
        self.last_listing_update = now;
        Metrics::table_rows(self.table.len());
        debug!(?outcome, "Listing pulled");
        Ok(true)
    }

    /// Try one ticker page, then evaluate the snapshot trigger whatever the
    /// outcome of the pull.
    async fn ticker_attempt(&mut self) -> AppResult<()> {
        let pulled = self.pull_ticker_page().await;

        if let Err(e) = self.maybe_snapshot() {
            if pulled.is_ok() {
                return Err(e);
            }
            // The pull error is the one the loop routes.
            self.report(&e);
        }
        pulled
    }

    async fn pull_ticker_page(&mut self) -> AppResult<()> {
        let now = self.clock.now();
        if !self.gate.is_pull_allowed(now) {
            Metrics::pull(Endpoint::Ticker.as_str(), "gated");
            return Ok(());
        }
        let Some(page) = self.cursor.next_page() else {
            warn!("Ticker page requested before the address space is known");
            return Ok(());
        };

        let url = ticker_page_url(
            &self.config.api.ticker.address,
            page,
            self.cursor.page_length(),
        )?;
        self.gate.record_pull(now);
        let fetched = self.fetch(&url).await;
        let rows = observe(
            Endpoint::Ticker,
            fetched.and_then(|doc| parse_ticker(doc).map_err(AppError::from)),
        )?;

        let outcome = self.merge.merge_ticker(&mut self.table, rows);
        Metrics::ticker_cycles(self.cursor.cycles_completed());
        debug!(
            page,
            updated = outcome.updated,
            ignored = outcome.ignored,
            coming_page = ?self.cursor.coming_page(),
            "Ticker page merged"
        );
        Ok(())
    }

    async fn fetch(&self, url: &str) -> AppResult<Value> {
        Ok(self.client.get_json(url).await?)
    }

    fn maybe_snapshot(&mut self) -> AppResult<()> {
        let now = self.clock.now();
        if !self.trigger.should_fire(&self.cursor, &mut self.gate, now) {
            return Ok(());
        }

        // The window opens even if the export fails; the next chance is the
        // following cycle.
        self.trigger.mark_fired(&self.cursor, &mut self.gate, now);
        let rows = self
            .persistor
            .persist(&self.config.persist.filename, &self.table)?;

        self.snapshots += 1;
        Metrics::snapshot_exported();
        info!(
            rows,
            cycle = self.trigger.last_snapshot_cycle(),
            name = %self.config.persist.filename,
            "Snapshot exported"
        );
        Ok(())
    }

    fn report(&self, err: &AppError) {
        let category = err.category();
        match category {
            IncidentCategory::ApiError => {
                warn!(error = %err, backoff_secs = self.config.api.error_timeout, "Source refused request")
            }
            IncidentCategory::Error => {
                error!(error = ?err, backoff_secs = self.config.api.error_timeout, "Iteration failed")
            }
        }
        self.log_incident(err.to_string(), category);
    }

    fn record_shutdown(&self) {
        info!(snapshots = self.snapshots, rows = self.table.len(), "Shutting down");
        self.log_incident(AppError::Shutdown.to_string(), AppError::Shutdown.category());
    }

    fn log_incident(&self, message: String, category: IncidentCategory) {
        Metrics::incident(category.as_str());
        let entry = IncidentEntry::new(message, self.clock.now());
        if let Err(e) = self.incidents.log(&entry, category) {
            error!(error = %e, %category, "Failed to write incident log");
        }
    }
}

/// Count the outcome of a pull that went out.
fn observe<T>(endpoint: Endpoint, result: AppResult<T>) -> AppResult<T> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) if e.is_upstream() => "upstream_error",
        Err(_) => "error",
    };
    Metrics::pull(endpoint.as_str(), outcome);
    result
}
