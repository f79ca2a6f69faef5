//! Round-robin cursor over ticker pages.
//!
//! Pages are 1-based offsets spaced `page_length` apart: 1, 1+L, 1+2L, ...
//! When the next offset would pass `max_page` the cursor wraps to 1 and
//! reports a completed cycle until the following draw.

use tracing::debug;

/// Stateful page offset generator.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page_length: u32,
    max_page: Option<u32>,
    last_page: Option<u32>,
    next_page: Option<u32>,
    completed_full_cycle: bool,
    cycles_completed: u64,
}

impl PageCursor {
    /// Create a cursor. `max_page` is supplied later via `set_max_page`.
    ///
    /// A zero page length is treated as one.
    pub fn new(page_length: u32) -> Self {
        Self {
            page_length: page_length.max(1),
            max_page: None,
            last_page: None,
            next_page: None,
            completed_full_cycle: false,
            cycles_completed: 0,
        }
    }

    pub fn set_max_page(&mut self, max_page: u32) {
        if self.max_page != Some(max_page) {
            debug!(max_page, page_length = self.page_length, "Ticker address space sized");
        }
        self.max_page = Some(max_page);
    }

    pub fn max_page(&self) -> Option<u32> {
        self.max_page
    }

    pub fn page_length(&self) -> u32 {
        self.page_length
    }

    /// Draw the next page to request.
    ///
    /// Returns `None` while `max_page` is unknown.
    pub fn next_page(&mut self) -> Option<u32> {
        let max_page = self.max_page?;

        let page = self.next_page.unwrap_or(1);
        let mut advanced = page.saturating_add(self.page_length);

        self.completed_full_cycle = false;
        if advanced > max_page {
            advanced = 1;
            self.completed_full_cycle = true;
            self.cycles_completed += 1;
            debug!(cycles = self.cycles_completed, "Ticker cursor wrapped");
        }

        self.last_page = Some(page);
        self.next_page = Some(advanced);
        Some(page)
    }

    /// Page the next draw will return; `None` before the first draw.
    pub fn coming_page(&self) -> Option<u32> {
        self.next_page
    }

    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    /// Whether the most recent draw wrapped the cursor.
    pub fn completed_full_cycle(&self) -> bool {
        self.completed_full_cycle
    }

    /// Number of wraps so far.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }
}
