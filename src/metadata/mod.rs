//! Metadata store adapter for system metrics records
//!
//! Provides create/load plus the two incremental updates the ingestion path
//! needs, each atomic per record:
//! - `append_chunk`: push one key onto `artifact.chunks`
//! - `mark_completed`: set `completed_at`
//!
//! # Example
//!
//! ```rust
//! use sysmetrics_store::metadata::{MemoryMetadataStore, MetadataStore};
//! use sysmetrics_store::model::{ArtifactOptions, SystemMetrics, SystemMetricsInfo};
//!
//! # async fn example() -> sysmetrics_store::Result<()> {
//! let store = MemoryMetadataStore::new();
//! let record = SystemMetrics::new(SystemMetricsInfo::default(), ArtifactOptions::default())?;
//!
//! store.save(&record).await?;
//! store.append_chunk(record.id(), "prefix/0").await?;
//! assert_eq!(store.load(record.id()).await?.chunk_count(), 1);
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;

pub use file::FileMetadataStore;
pub use memory::MemoryMetadataStore;

use chrono::{DateTime, Utc};

use crate::model::SystemMetrics;
use crate::Result;
use std::future::Future;

/// Document store holding [`SystemMetrics`] records keyed by ID.
pub trait MetadataStore: Send + Sync {
    /// Load a record by ID.
    ///
    /// Fails with [`crate::Error::RecordNotFound`] if no such ID exists.
    fn load(&self, id: &str) -> impl Future<Output = Result<SystemMetrics>> + Send;

    /// Create a new record.
    ///
    /// Fails with [`crate::Error::RecordExists`] if the ID is taken, so at
    /// most one record exists per fingerprint.
    fn save(&self, record: &SystemMetrics) -> impl Future<Output = Result<()>> + Send;

    /// Atomically append one chunk key to the record's chunk list.
    fn append_chunk(&self, id: &str, chunk_key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Set the record's completion timestamp.
    fn mark_completed(
        &self,
        id: &str,
        completed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Check the store is reachable.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Release connections and file handles.
    fn close(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
