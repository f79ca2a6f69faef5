//! Merge of parsed responses into the canonical table.
//!
//! Rules by source:
//! - Listing into an empty table: wholesale assign.
//! - Listing into a populated table: right join on the natural key. The
//!   listing decides which assets exist; existing rows contribute columns
//!   the listing does not carry.
//! - First ticker page ever merged: left join on the natural key onto the
//!   listing-seeded rows. Unmatched ticker rows are ignored.
//! - Every later ticker page: patch by id, non-null fields only. Unknown
//!   ids are ignored. Idempotent.
//!
//! The global summary never touches the table.

use cmc_core::{AssetRecord, CanonicalTable, NaturalKey};
use std::collections::HashSet;
use tracing::{debug, info};

/// Row counts of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Rows added that had no counterpart.
    pub inserted: usize,
    /// Existing rows that received fields.
    pub updated: usize,
    /// Existing rows removed as stale.
    pub dropped: usize,
    /// Incoming rows with nothing to attach to.
    pub ignored: usize,
}

/// Applies listing and ticker results to a `CanonicalTable`.
///
/// The only state kept is whether a ticker page has been merged yet, which
/// selects between the seeding join and the id patch.
#[derive(Debug, Default)]
pub struct MergeEngine {
    ticker_seeded: bool,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first ticker page has been joined in.
    pub fn ticker_seeded(&self) -> bool {
        self.ticker_seeded
    }

    /// Merge a parsed listing.
    pub fn merge_listing(&self, table: &mut CanonicalTable, listing: Vec<AssetRecord>) -> MergeOutcome {
        if table.is_empty() {
            table.replace_all(listing);
            let outcome = MergeOutcome {
                inserted: table.len(),
                ..MergeOutcome::default()
            };
            info!(rows = table.len(), "Canonical table seeded from listing");
            return outcome;
        }

        let existing_by_key = table.natural_key_index();
        let incoming_keys: HashSet<NaturalKey> = listing.iter().map(AssetRecord::natural_key).collect();

        let mut outcome = MergeOutcome {
            dropped: existing_by_key
                .keys()
                .filter(|key| !incoming_keys.contains(*key))
                .count(),
            ..MergeOutcome::default()
        };

        let mut merged = Vec::with_capacity(listing.len());
        for incoming in listing {
            let existing = existing_by_key
                .get(&incoming.natural_key())
                .and_then(|id| table.get(id));

            match existing {
                Some(row) => {
                    let mut row = row.clone();
                    row.id = incoming.id;
                    row.overlay(&incoming, false);
                    merged.push(row);
                    outcome.updated += 1;
                }
                None => {
                    merged.push(incoming);
                    outcome.inserted += 1;
                }
            }
        }

        table.replace_all(merged);

        debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            dropped = outcome.dropped,
            rows = table.len(),
            "Merged listing refresh"
        );
        outcome
    }

    /// Merge one parsed ticker page.
    pub fn merge_ticker(&mut self, table: &mut CanonicalTable, page: Vec<AssetRecord>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if self.ticker_seeded {
            for incoming in &page {
                if table.patch(incoming, true) {
                    outcome.updated += 1;
                } else {
                    outcome.ignored += 1;
                }
            }
        } else {
            let by_key = table.natural_key_index();
            for incoming in &page {
                match by_key.get(&incoming.natural_key()) {
                    Some(id) => {
                        table.patch_row(id, incoming, false);
                        outcome.updated += 1;
                    }
                    None => outcome.ignored += 1,
                }
            }
            self.ticker_seeded = true;
            info!(
                attached = outcome.updated,
                unmatched = outcome.ignored,
                "First ticker page joined onto listing"
            );
        }

        debug!(
            updated = outcome.updated,
            ignored = outcome.ignored,
            "Merged ticker page"
        );
        outcome
    }
}
