//! Blob storage.
//!
//! A bucket holds named objects. Writers stage a local file first and then
//! upload it by name; readers get the object's bytes back.

use crate::error::{PersistenceError, PersistenceResult};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Named-object store.
pub trait BlobStore: Send + Sync {
    /// Read the object `name`.
    fn read(&self, name: &str) -> PersistenceResult<Vec<u8>>;

    /// Upload the local file at `local_path` as object `name`, replacing any
    /// previous version.
    fn write(&self, name: &str, local_path: &Path) -> PersistenceResult<()>;

    /// Bucket identifier, for logs.
    fn bucket(&self) -> &str;
}

/// Bucket backed by a directory: `<root>/<bucket>/<name>`.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    bucket: String,
    dir: PathBuf,
}

impl DirBlobStore {
    /// Open (creating if needed) the bucket directory.
    pub fn open(root: impl AsRef<Path>, bucket: impl Into<String>) -> PersistenceResult<Self> {
        let bucket = bucket.into();
        validate_name(&bucket)?;
        let dir = root.as_ref().join(&bucket);
        fs::create_dir_all(&dir)?;
        Ok(Self { bucket, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, name: &str) -> PersistenceResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }
}

impl BlobStore for DirBlobStore {
    fn read(&self, name: &str) -> PersistenceResult<Vec<u8>> {
        let path = self.object_path(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PersistenceError::NotFound {
                bucket: self.bucket.clone(),
                name: name.to_string(),
            },
            _ => PersistenceError::Io(e),
        })
    }

    fn write(&self, name: &str, local_path: &Path) -> PersistenceResult<()> {
        let target = self.object_path(name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // Copy to a sibling temp file and rename so readers never see a
        // half-written object.
        let tmp = target.with_extension("upload");
        fs::copy(local_path, &tmp)?;
        fs::rename(&tmp, &target)?;

        debug!(bucket = %self.bucket, name, "Blob uploaded");
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Object and bucket names are relative paths without `..` or roots.
fn validate_name(name: &str) -> PersistenceResult<()> {
    let path = Path::new(name);
    let ok = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(PersistenceError::InvalidName(name.to_string()))
    }
}
