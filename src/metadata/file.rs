//! File-backed metadata store: one JSON document per record.
//!
//! Every write goes to a fsynced temporary file first. `save` hard-links it
//! into place, so creation stays exclusive; updates rename it over the
//! document. A reader never sees a half-written record.
//!
//! Writes for one record are serialized by an async mutex that exists only
//! while some operation on that record is in flight.

use std::future::Future;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::MetadataStore;
use crate::model::SystemMetrics;
use crate::{Error, Result};

/// Metadata store persisting records as `{root}/{id}.json`.
#[derive(Debug)]
pub struct FileMetadataStore {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileMetadataStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    /// Get the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::RecordNotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    /// Run `op` holding the record's write lock, then drop the lock entry
    /// if no other operation is waiting on it.
    async fn locked<T>(&self, id: &str, op: impl Future<Output = Result<T>> + Send) -> Result<T> {
        let lock = Arc::clone(self.locks.entry(id.to_string()).or_default().value());
        let outcome = {
            let _guard = lock.lock().await;
            op.await
        };
        drop(lock);
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        outcome
    }

    async fn read(&self, id: &str) -> Result<SystemMetrics> {
        let path = self.document_path(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(Error::RecordNotFound(id.to_string()));
            }
            Err(e) => return Err(Error::Metadata(format!("read '{}': {e}", path.display()))),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write `record` to `{path}.tmp` and fsync it. The temp file is removed
    /// on failure.
    async fn write_temp(path: &Path, record: &SystemMetrics) -> Result<PathBuf> {
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(tmp)
    }

    #[cfg(target_family = "unix")]
    async fn sync_root(&self) -> Result<()> {
        tokio::fs::File::open(&self.root).await?.sync_all().await?;
        Ok(())
    }

    #[cfg(not(target_family = "unix"))]
    async fn sync_root(&self) -> Result<()> {
        Ok(())
    }

    async fn create(&self, record: &SystemMetrics) -> Result<()> {
        let path = self.document_path(record.id())?;
        let tmp = Self::write_temp(&path, record).await?;

        let linked = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => self.sync_root().await,
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                Err(Error::RecordExists(record.id().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, record: &SystemMetrics) -> Result<()> {
        let path = self.document_path(record.id())?;
        let tmp = Self::write_temp(&path, record).await?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        self.sync_root().await
    }

    async fn update(&self, id: &str, apply: impl FnOnce(&mut SystemMetrics) + Send) -> Result<()> {
        self.locked(id, async {
            let mut record = self.read(id).await?;
            apply(&mut record);
            self.replace(&record).await
        })
        .await
    }
}

impl MetadataStore for FileMetadataStore {
    async fn load(&self, id: &str) -> Result<SystemMetrics> {
        self.read(id).await
    }

    async fn save(&self, record: &SystemMetrics) -> Result<()> {
        self.locked(record.id(), self.create(record)).await
    }

    async fn append_chunk(&self, id: &str, chunk_key: &str) -> Result<()> {
        self.update(id, |record| record.push_chunk(chunk_key)).await
    }

    async fn mark_completed(&self, id: &str, completed_at: DateTime<Utc>) -> Result<()> {
        self.update(id, |record| record.complete(completed_at)).await
    }

    async fn ping(&self) -> Result<()> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::Metadata(format!(
                "'{}' is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(Error::Metadata(format!(
                "metadata root '{}' unreachable: {e}",
                self.root.display()
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.locks.clear();
        Ok(())
    }
}
