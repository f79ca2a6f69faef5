//! Once-per-cycle snapshot decision.
//!
//! A snapshot is due when the cursor is about to restart at page 1, no
//! cool-down window is open, and the cycle that just wrapped has not been
//! exported yet.

use chrono::{DateTime, Utc};
use cmc_schedule::{PageCursor, PullGate};

#[derive(Debug, Clone, Default)]
pub struct PersistenceTrigger {
    last_snapshot_cycle: u64,
}

impl PersistenceTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to export now. Refreshes the gate's cool-down flag.
    pub fn should_fire(&self, cursor: &PageCursor, gate: &mut PullGate, now: DateTime<Utc>) -> bool {
        let in_cooldown = gate.refresh_cooldown(now);
        cursor.coming_page() == Some(1)
            && !in_cooldown
            && cursor.cycles_completed() > self.last_snapshot_cycle
    }

    /// Mark the cursor's current cycle as exported and open the cool-down.
    pub fn mark_fired(&mut self, cursor: &PageCursor, gate: &mut PullGate, now: DateTime<Utc>) {
        self.last_snapshot_cycle = cursor.cycles_completed();
        gate.open_cooldown(now);
    }

    /// Cycle number of the last export; 0 before the first.
    pub fn last_snapshot_cycle(&self) -> u64 {
        self.last_snapshot_cycle
    }
}
