//! Chunk compression at rest
//!
//! Provides transparent LZ4/ZSTD compression for any `BlobBucket` backend.

use serde::{Deserialize, Serialize};

use super::BlobBucket;
use crate::{Error, Result};

/// Compression algorithm for stored chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Chunks are stored exactly as received (default)
    #[default]
    None,
    /// LZ4 - Fast compression, good for real-time
    Lz4,
    /// ZSTD - Better ratio, slower
    Zstd,
}

impl Compression {
    /// Get algorithm name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Compress data using this algorithm
    ///
    /// # Errors
    /// Returns error if compression fails (e.g., ZSTD internal error)
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Self::Zstd => zstd::encode_all(data, 3)
                .map_err(|e| Error::StorageWriteFailed(format!("ZSTD compression failed: {e}"))),
        }
    }

    /// Decompress data using this algorithm
    ///
    /// # Errors
    /// Returns error if decompression fails (e.g., corrupted data)
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| Error::Blob(format!("LZ4 decompression failed: {e}"))),
            Self::Zstd => zstd::decode_all(data)
                .map_err(|e| Error::Blob(format!("ZSTD decompression failed: {e}"))),
        }
    }
}

/// Compressed bucket wrapper
///
/// Wraps any `BlobBucket` implementation and transparently compresses
/// payloads on `put` and decompresses them on `get`.
#[derive(Debug)]
pub struct CompressedBucket<B: BlobBucket> {
    inner: B,
    compression: Compression,
}

impl<B: BlobBucket> CompressedBucket<B> {
    /// Create a new compressed bucket wrapping the given bucket
    #[must_use]
    pub const fn new(inner: B, compression: Compression) -> Self {
        Self { inner, compression }
    }

    /// Get reference to inner bucket (for inspection/testing)
    #[must_use]
    pub const fn inner(&self) -> &B {
        &self.inner
    }

    /// Get compression algorithm
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }
}

impl<B: BlobBucket> BlobBucket for CompressedBucket<B> {
    async fn put(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        let compressed = self.compression.compress(&payload)?;
        self.inner.put(key, compressed).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let stored = self.inner.get(key).await?;
        self.compression.decompress(&stored)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }
}
