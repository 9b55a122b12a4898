//! Blob store adapter for chunk payloads
//!
//! Chunks are placed at record-scoped keys (`{prefix}/{suffix}`). The store
//! never lists or orders keys; chunk order lives in the metadata record.
//!
//! # Example
//!
//! ```rust
//! use sysmetrics_store::blob::{BlobBucket, ObjectStoreBucket};
//!
//! # async fn example() -> sysmetrics_store::Result<()> {
//! let bucket = ObjectStoreBucket::in_memory();
//!
//! bucket.put("record/0", b"cpu=1".to_vec()).await?;
//! assert_eq!(bucket.get("record/0").await?, b"cpu=1".to_vec());
//! assert!(!bucket.exists("record/1").await?);
//! # Ok(())
//! # }
//! ```

mod compression;
mod object;

pub use compression::{CompressedBucket, Compression};
pub use object::ObjectStoreBucket;

use crate::Result;
use std::future::Future;

/// Key-addressed binary storage for chunk payloads.
pub trait BlobBucket: Send + Sync {
    /// Write `payload` at `key`.
    ///
    /// Overwrites any existing value. Failures surface as
    /// [`crate::Error::StorageWriteFailed`].
    fn put(&self, key: &str, payload: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Read a previously stored payload.
    ///
    /// A missing key is a [`crate::Error::Blob`] error.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;
}
