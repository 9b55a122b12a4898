//! `BlobBucket` over the `object_store` crate.
//!
//! One adapter covers every backend the service is configured with: local
//! disk (tests, single-node deployments), S3, and process-local memory.

use std::path::Path;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};

use super::BlobBucket;
use crate::{Error, Result};

/// Bucket backed by an [`ObjectStore`].
///
/// Cloning is cheap and shares the underlying store.
#[derive(Debug, Clone)]
pub struct ObjectStoreBucket {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBucket {
    /// Wrap an already-built object store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create an empty in-memory bucket.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Open a bucket rooted at a local directory, creating it if needed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] if the directory cannot be
    /// created or used as a bucket root.
    pub async fn local(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            Error::InvalidConfiguration(format!(
                "cannot create local bucket '{}': {e}",
                root.display()
            ))
        })?;
        let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
            Error::InvalidConfiguration(format!("cannot open local bucket '{}': {e}", root.display()))
        })?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Open an S3 bucket. Credentials come from the standard AWS environment.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] if the client cannot be built.
    pub fn s3(bucket: &str, region: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("cannot open S3 bucket '{bucket}': {e}")))?;
        Ok(Self::new(Arc::new(store)))
    }

    fn location(key: &str) -> Result<ObjectPath> {
        ObjectPath::parse(key).map_err(|e| Error::Blob(format!("invalid blob key '{key}': {e}")))
    }
}

impl BlobBucket for ObjectStoreBucket {
    async fn put(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        let location = Self::location(key).map_err(Error::into_write_failure)?;
        self.store
            .put(&location, PutPayload::from(payload))
            .await
            .map_err(|e| Error::StorageWriteFailed(format!("put '{key}': {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let location = Self::location(key)?;
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| Error::Blob(format!("get '{key}': {e}")))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| Error::Blob(format!("read '{key}': {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let location = Self::location(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Error::Blob(format!("head '{key}': {e}"))),
        }
    }
}
