//! Durable storage for the market-data ingester.
//!
//! Snapshots of the canonical table are written as CSV and uploaded to a
//! blob bucket; recoverable failures are appended to per-category incident
//! logs in the same bucket.

pub mod blob;
pub mod csv_writer;
pub mod error;
pub mod incident_log;

pub use blob::{BlobStore, DirBlobStore};
pub use csv_writer::{write_csv, CsvPersistor, Persistor};
pub use error::{PersistenceError, PersistenceResult};
pub use incident_log::{IncidentCategory, IncidentEntry, IncidentLog, IncidentSink};
