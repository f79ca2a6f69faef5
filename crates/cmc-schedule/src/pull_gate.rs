//! Outbound request pacing.
//!
//! One gate is shared by all three endpoints. A pull is allowed when the
//! minimum interval since the previous pull has elapsed and no post-snapshot
//! cool-down window is open. The gate never changes state while answering
//! `is_pull_allowed`; callers record pulls and cool-down transitions
//! explicitly.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Shared pull gate and cool-down window.
#[derive(Debug, Clone)]
pub struct PullGate {
    /// Time of the last pull that actually went out.
    last_pull: DateTime<Utc>,
    /// Minimum spacing between any two pulls.
    min_interval: Duration,
    /// Start of the current cool-down window, if any.
    cooldown_start: Option<DateTime<Utc>>,
    /// Length of a cool-down window.
    cooldown: Duration,
    /// Last evaluated cool-down state.
    in_cooldown: bool,
}

impl PullGate {
    /// Create a gate whose first pull becomes allowed `min_interval` after
    /// `created_at`.
    pub fn new(created_at: DateTime<Utc>, min_interval: Duration, cooldown: Duration) -> Self {
        Self {
            last_pull: created_at,
            min_interval,
            cooldown_start: None,
            cooldown,
            in_cooldown: false,
        }
    }

    /// Whether a pull may go out at `now`.
    #[must_use]
    pub fn is_pull_allowed(&self, now: DateTime<Utc>) -> bool {
        now - self.last_pull > self.min_interval && !self.cooldown_active_at(now)
    }

    /// Record that a pull went out at `now`.
    pub fn record_pull(&mut self, now: DateTime<Utc>) {
        self.last_pull = now;
    }

    /// Open a cool-down window starting at `now`.
    pub fn open_cooldown(&mut self, now: DateTime<Utc>) {
        self.cooldown_start = Some(now);
        self.in_cooldown = true;
        info!(
            until = %(now + self.cooldown),
            "Cool-down window opened"
        );
    }

    /// Re-evaluate the cool-down flag against `now` and return it.
    pub fn refresh_cooldown(&mut self, now: DateTime<Utc>) -> bool {
        let active = self.cooldown_active_at(now);
        if self.in_cooldown && !active {
            debug!("Cool-down window elapsed");
        }
        self.in_cooldown = active;
        active
    }

    /// Cool-down state as of the last transition.
    pub fn in_cooldown(&self) -> bool {
        self.in_cooldown
    }

    pub fn last_pull(&self) -> DateTime<Utc> {
        self.last_pull
    }

    pub fn cooldown_start(&self) -> Option<DateTime<Utc>> {
        self.cooldown_start
    }

    fn cooldown_active_at(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_start
            .map(|start| now - start <= self.cooldown)
            .unwrap_or(false)
    }
}
