//! Initialization progress.
//!
//! Tracks which data has been obtained at least once. Stages complete
//! strictly in order: global summary, listing, one full ticker cycle.
//! Once `Ready` the engine switches to steady-state refreshes and the stage
//! never changes again.

use std::fmt;
use tracing::info;

/// Initialization state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum InitStage {
    /// No global summary yet; the ticker address space is unknown.
    #[default]
    AwaitingGlobal,
    /// Global summary obtained; waiting for the first listing.
    AwaitingListing,
    /// Listing seeded; walking the ticker pages for the first time.
    AwaitingTickerCycle,
    /// Every source has been obtained at least once.
    Ready,
}

impl InitStage {
    pub fn global_done(&self) -> bool {
        *self > InitStage::AwaitingGlobal
    }

    pub fn listing_done(&self) -> bool {
        *self > InitStage::AwaitingListing
    }

    pub fn ticker_cycle_done(&self) -> bool {
        *self == InitStage::Ready
    }

    pub fn is_ready(&self) -> bool {
        *self == InitStage::Ready
    }

    /// A global pull succeeded.
    pub fn on_global_success(&mut self) {
        self.advance_from(InitStage::AwaitingGlobal, InitStage::AwaitingListing);
    }

    /// A listing pull succeeded.
    pub fn on_listing_success(&mut self) {
        self.advance_from(InitStage::AwaitingListing, InitStage::AwaitingTickerCycle);
    }

    /// The ticker cursor completed a full cycle.
    pub fn on_ticker_cycle_complete(&mut self) {
        self.advance_from(InitStage::AwaitingTickerCycle, InitStage::Ready);
    }

    /// Numeric position, for gauges.
    pub fn ordinal(&self) -> u8 {
        match self {
            InitStage::AwaitingGlobal => 0,
            InitStage::AwaitingListing => 1,
            InitStage::AwaitingTickerCycle => 2,
            InitStage::Ready => 3,
        }
    }

    fn advance_from(&mut self, from: InitStage, to: InitStage) {
        if *self == from {
            *self = to;
            if to.is_ready() {
                info!("Initialization complete: global, listing and full ticker cycle obtained");
            } else {
                info!(stage = %to, "Initialization stage advanced");
            }
        }
    }
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InitStage::AwaitingGlobal => "awaiting_global",
            InitStage::AwaitingListing => "awaiting_listing",
            InitStage::AwaitingTickerCycle => "awaiting_ticker_cycle",
            InitStage::Ready => "ready",
        };
        f.write_str(s)
    }
}
