//! Pull scheduling for the market-data ingester.
//!
//! - `PullGate`: shared minimum-interval throttle and cool-down window
//! - `PageCursor`: round-robin ticker page offsets
//! - `InitStage`: initialization state machine

pub mod init_stage;
pub mod page_cursor;
pub mod pull_gate;

pub use init_stage::InitStage;
pub use page_cursor::PageCursor;
pub use pull_gate::PullGate;
