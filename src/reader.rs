//! Downstream read path: reassemble a record's artifact from its chunks.

use std::sync::Arc;

use crate::blob::BlobBucket;
use crate::env::Environment;
use crate::metadata::MetadataStore;
use crate::model::SystemMetrics;
use crate::Result;

/// Reads stored chunks back in the order recorded on the record.
#[derive(Debug)]
pub struct ArtifactReader<M: MetadataStore> {
    env: Arc<Environment<M>>,
}

impl<M: MetadataStore> ArtifactReader<M> {
    /// Create a reader over an environment.
    #[must_use]
    pub const fn new(env: Arc<Environment<M>>) -> Self {
        Self { env }
    }

    /// Load the record and every chunk payload, decompressed, in
    /// `artifact.chunks` order.
    ///
    /// # Errors
    /// [`crate::Error::RecordNotFound`], [`crate::Error::InvalidConfiguration`]
    /// if the bucket cannot be opened, or [`crate::Error::Blob`] if a chunk
    /// cannot be read.
    pub async fn read_chunks(&self, id: &str) -> Result<(SystemMetrics, Vec<Vec<u8>>)> {
        let record = self.env.metadata().load(id).await?;
        let bucket = self.env.bucket(record.artifact()).await?;

        let mut chunks = Vec::with_capacity(record.chunk_count());
        for key in record.artifact().chunks() {
            chunks.push(bucket.get(key).await?);
        }
        Ok((record, chunks))
    }

    /// Concatenated payload of all chunks.
    ///
    /// # Errors
    /// Same as [`Self::read_chunks`].
    pub async fn read_all(&self, id: &str) -> Result<Vec<u8>> {
        let (_, chunks) = self.read_chunks(id).await?;
        Ok(chunks.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Compression;
    use crate::config::ServiceConfig;
    use crate::ingest::{IngestionService, MetricsChunk};
    use crate::model::{ArtifactOptions, BucketKind, SystemMetricsInfo};
    use crate::Error;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_reader_decompresses_in_order() {
        let env = Arc::new(Environment::in_memory(ServiceConfig::with_system_metrics_bucket("mem")));
        let record = SystemMetrics::new(
            SystemMetricsInfo {
                project: "reader".to_string(),
                ..Default::default()
            },
            ArtifactOptions {
                kind: BucketKind::InMemory,
                compression: Compression::Zstd,
                ..Default::default()
            },
        )
        .unwrap();
        env.metadata().save(&record).await.unwrap();

        let service = IngestionService::new(Arc::clone(&env));
        let cancel = CancellationToken::new();
        for part in ["one,", "two,", "three"] {
            service
                .add_system_metrics(MetricsChunk::new(record.id(), part.as_bytes()), &cancel)
                .await
                .unwrap();
        }

        let reader = ArtifactReader::new(env);
        assert_eq!(reader.read_all(record.id()).await.unwrap(), b"one,two,three".to_vec());
    }

    #[tokio::test]
    async fn test_reader_missing_record() {
        let env = Arc::new(Environment::in_memory(ServiceConfig::with_system_metrics_bucket("mem")));
        let reader = ArtifactReader::new(env);

        assert!(matches!(
            reader.read_all("DNE").await.unwrap_err(),
            Error::RecordNotFound(_)
        ));
    }
}
