//! Serving environment: metadata store handle, live configuration, and the
//! bucket backends opened so far.
//!
//! Built once by the process bootstrapper, shared with every service behind
//! an `Arc`, and torn down at shutdown. After [`Environment::teardown`] every
//! ingestion call fails with [`Error::InvalidEnvironment`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use dashmap::DashMap;

use crate::blob::{CompressedBucket, ObjectStoreBucket};
use crate::config::ServiceConfig;
use crate::metadata::{MemoryMetadataStore, MetadataStore};
use crate::model::{ArtifactInfo, BucketKind};
use crate::{Error, Result};

/// Bucket handle used for one record's chunks.
pub type RecordBucket = CompressedBucket<ObjectStoreBucket>;

/// Process-wide dependencies injected into the ingestion service.
#[derive(Debug)]
pub struct Environment<M: MetadataStore> {
    metadata: M,
    config: RwLock<ServiceConfig>,
    buckets: DashMap<(BucketKind, String), ObjectStoreBucket>,
    closed: AtomicBool,
}

impl Environment<MemoryMetadataStore> {
    /// Environment with an in-memory metadata store.
    #[must_use]
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self::new(MemoryMetadataStore::new(), config)
    }
}

impl<M: MetadataStore> Environment<M> {
    /// Create an environment around an opened metadata store.
    #[must_use]
    pub fn new(metadata: M, config: ServiceConfig) -> Self {
        Self {
            metadata,
            config: RwLock::new(config),
            buckets: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Get the metadata store.
    #[must_use]
    pub const fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> ServiceConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration. Already-opened buckets stay cached under
    /// their old location.
    pub fn set_config(&self, config: ServiceConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Check if the environment was torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Bucket for a record's artifact, opened on first use per
    /// `(kind, location)` and wrapped with the artifact's compression.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] if the current configuration
    /// cannot serve the artifact's backend kind.
    pub async fn bucket(&self, artifact: &ArtifactInfo) -> Result<RecordBucket> {
        let bucket = self.config().bucket;
        let kind = artifact.kind();
        bucket.ensure_usable_for(kind)?;

        let cache_key = (kind, bucket.system_metrics_bucket.clone());
        if let Some(opened) = self.buckets.get(&cache_key) {
            return Ok(CompressedBucket::new(opened.clone(), artifact.compression()));
        }

        let location = bucket.system_metrics_bucket.as_str();
        let opened = match kind {
            BucketKind::Local => ObjectStoreBucket::local(location).await?,
            BucketKind::S3 => ObjectStoreBucket::s3(location, bucket.region.as_deref().unwrap_or_default())?,
            BucketKind::InMemory => ObjectStoreBucket::in_memory(),
        };
        tracing::info!(kind = kind.as_str(), location, "opened system metrics bucket");

        let opened = self.buckets.entry(cache_key).or_insert(opened).clone();
        Ok(CompressedBucket::new(opened, artifact.compression()))
    }

    /// Close the metadata store and drop cached buckets.
    ///
    /// # Errors
    /// Returns error if the metadata store fails to close. The environment
    /// is marked closed either way.
    pub async fn teardown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.buckets.clear();
        tracing::info!("tearing down environment");
        self.metadata.close().await
    }
}
