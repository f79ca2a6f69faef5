//! Canonical asset table.
//!
//! One row per asset id. The column set only grows: every column ever seen
//! in a merged row stays in the header, in first-observed order, even after
//! the rows that carried it are gone.

use crate::record::{AssetId, AssetRecord, NaturalKey, KEY_COLUMNS};
use std::collections::{BTreeMap, HashMap};

/// The consolidated table keyed by asset id.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    rows: BTreeMap<AssetId, AssetRecord>,
    columns: Vec<String>,
}

impl Default for CanonicalTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalTable {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            columns: KEY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.rows.contains_key(id)
    }

    /// Rows in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.rows.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AssetId> {
        self.rows.keys()
    }

    /// Union of all observed columns, key columns first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Replace every row. Columns observed so far are kept.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = AssetRecord>) {
        self.rows.clear();
        for record in records {
            self.insert(record);
        }
    }

    /// Insert or replace the row for `record.id`.
    pub fn insert(&mut self, record: AssetRecord) {
        self.observe_columns(&record);
        self.rows.insert(record.id, record);
    }

    /// Overlay `incoming` onto the row with the same id.
    ///
    /// Returns `false` and leaves the table untouched when no such row exists.
    pub fn patch(&mut self, incoming: &AssetRecord, skip_nulls: bool) -> bool {
        self.patch_row(&incoming.id, incoming, skip_nulls)
    }

    /// Overlay `incoming` onto the row `target`, whatever id `incoming` carries.
    pub fn patch_row(&mut self, target: &AssetId, incoming: &AssetRecord, skip_nulls: bool) -> bool {
        let Some(row) = self.rows.get_mut(target) else {
            return false;
        };
        row.overlay(incoming, skip_nulls);
        self.observe_columns(incoming);
        true
    }

    /// Natural key → id for every row.
    pub fn natural_key_index(&self) -> HashMap<NaturalKey, AssetId> {
        self.rows
            .values()
            .map(|r| (r.natural_key(), r.id))
            .collect()
    }

    fn observe_columns(&mut self, record: &AssetRecord) {
        for column in record.fields.keys() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.clone());
            }
        }
    }
}
