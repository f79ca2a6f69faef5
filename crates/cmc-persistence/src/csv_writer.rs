//! CSV snapshot export.
//!
//! One row per asset id, header = every column the table has observed,
//! no separate index column. The file is staged locally and then uploaded
//! to the blob store under the same name.

use crate::blob::BlobStore;
use crate::error::PersistenceResult;
use cmc_core::CanonicalTable;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Exports the canonical table.
pub trait Persistor: Send + Sync {
    /// Persist `table` as object `name`. Returns the number of rows written.
    fn persist(&self, name: &str, table: &CanonicalTable) -> PersistenceResult<usize>;
}

/// CSV persistor backed by a `BlobStore`.
pub struct CsvPersistor {
    store: Arc<dyn BlobStore>,
    staging_dir: PathBuf,
}

impl CsvPersistor {
    pub fn new(store: Arc<dyn BlobStore>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging_dir: staging_dir.into(),
        }
    }

    fn stage(&self, name: &str, table: &CanonicalTable) -> PersistenceResult<PathBuf> {
        let path = self.staging_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_csv(&path, table)?;
        Ok(path)
    }
}

impl Persistor for CsvPersistor {
    fn persist(&self, name: &str, table: &CanonicalTable) -> PersistenceResult<usize> {
        let path = self.stage(name, table)?;
        self.store.write(name, &path)?;

        info!(
            bucket = %self.store.bucket(),
            name,
            rows = table.len(),
            columns = table.columns().len(),
            "Snapshot persisted"
        );
        Ok(table.len())
    }
}

/// Write `table` to `path` as CSV.
pub fn write_csv(path: &Path, table: &CanonicalTable) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(table.columns())?;

    for record in table.iter() {
        let row: Vec<String> = table
            .columns()
            .iter()
            .map(|column| record.get(column).map(cell_text).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
