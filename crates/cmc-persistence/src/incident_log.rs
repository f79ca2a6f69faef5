//! Durable incident log.
//!
//! Failures the engine recovers from are appended, one JSON object per
//! line, to a local file per category, and the whole file is re-uploaded
//! after every entry so the bucket always holds the complete history.

use crate::blob::BlobStore;
use crate::error::PersistenceResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Incident category; selects the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    /// Transport, parsing and internal failures. Also shutdown events.
    Error,
    /// The source refused a request and explained why.
    ApiError,
}

impl IncidentCategory {
    pub fn file_name(&self) -> &'static str {
        match self {
            IncidentCategory::Error => "errors.log",
            IncidentCategory::ApiError => "api_errors.log",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentCategory::Error => "error",
            IncidentCategory::ApiError => "api_error",
        }
    }
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentEntry {
    pub message: String,
    /// Unix seconds.
    pub time: i64,
}

impl IncidentEntry {
    pub fn new(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            time: at.timestamp(),
        }
    }

    pub fn to_line(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Destination for incident entries.
pub trait IncidentSink: Send + Sync {
    fn log(&self, entry: &IncidentEntry, category: IncidentCategory) -> PersistenceResult<()>;
}

/// Local append + blob upload.
pub struct IncidentLog {
    store: Arc<dyn BlobStore>,
    staging_dir: PathBuf,
}

impl IncidentLog {
    pub fn new(store: Arc<dyn BlobStore>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging_dir: staging_dir.into(),
        }
    }
}

impl IncidentSink for IncidentLog {
    fn log(&self, entry: &IncidentEntry, category: IncidentCategory) -> PersistenceResult<()> {
        fs::create_dir_all(&self.staging_dir)?;
        let path = self.staging_dir.join(category.file_name());

        {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{}", entry.to_line()?)?;
            file.flush()?;
        }

        self.store.write(category.file_name(), &path)?;
        debug!(%category, "Incident logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::DirBlobStore;
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::default() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_entries_append_and_upload_per_category() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DirBlobStore::open(dir.path().join("buckets"), "logs").unwrap());
        let log = IncidentLog::new(store.clone(), dir.path().join("staging"));

        log.log(&IncidentEntry::new("first", at(10)), IncidentCategory::ApiError)
            .unwrap();
        log.log(&IncidentEntry::new("second", at(20)), IncidentCategory::ApiError)
            .unwrap();
        log.log(&IncidentEntry::new("boom", at(30)), IncidentCategory::Error)
            .unwrap();

        let api = String::from_utf8(store.read("api_errors.log").unwrap()).unwrap();
        let lines: Vec<IncidentEntry> = api
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(
            lines,
            vec![
                IncidentEntry::new("first", at(10)),
                IncidentEntry::new("second", at(20))
            ]
        );

        let errors = String::from_utf8(store.read("errors.log").unwrap()).unwrap();
        assert_eq!(errors.lines().count(), 1);
        assert!(errors.contains("\"time\":30"));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(IncidentCategory::ApiError.to_string(), "api_error");
        assert_eq!(IncidentCategory::Error.file_name(), "errors.log");
    }
}
