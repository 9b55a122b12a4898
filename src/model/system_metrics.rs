//! System metrics record - metadata for one task execution's metrics artifact

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SystemMetricsInfo;
use crate::blob::Compression;
use crate::Result;

/// Storage backend holding a record's chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// Directory on local disk.
    #[default]
    Local,
    /// Remote S3 bucket.
    S3,
    /// Process-local in-memory bucket.
    InMemory,
}

impl BucketKind {
    /// Get backend name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::S3 => "s3",
            Self::InMemory => "in_memory",
        }
    }
}

/// Encoding of the raw metric payload, as declared by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// Full-time diagnostic data capture.
    #[default]
    Ftdc,
    /// BSON documents.
    Bson,
    /// JSON documents.
    Json,
    /// Comma-separated values.
    Csv,
    /// Plain text.
    Text,
}

/// Options chosen by the producer when a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactOptions {
    /// Storage backend for the chunks.
    pub kind: BucketKind,
    /// Payload encoding.
    pub format: DataFormat,
    /// Compression applied to each chunk at rest.
    pub compression: Compression,
}

/// Where and how a record's chunks are stored.
///
/// `chunks` is append-only and ordered by arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    kind: BucketKind,
    prefix: String,
    #[serde(default)]
    format: DataFormat,
    #[serde(default)]
    compression: Compression,
    #[serde(default)]
    chunks: Vec<String>,
}

impl ArtifactInfo {
    /// Get the storage backend kind.
    #[must_use]
    pub const fn kind(&self) -> BucketKind {
        self.kind
    }

    /// Get the key prefix unique to this record.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the payload format.
    #[must_use]
    pub const fn format(&self) -> DataFormat {
        self.format
    }

    /// Get the at-rest compression.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Get the full blob keys of all stored chunks, in arrival order.
    #[must_use]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Blob key for a chunk of this artifact.
    #[must_use]
    pub fn chunk_key(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.prefix)
    }
}

/// System metrics record for a single task execution.
///
/// Created by a producer with an empty chunk list, then grown by the
/// ingestion service one chunk key at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetrics {
    id: String,
    info: SystemMetricsInfo,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    artifact: ArtifactInfo,
}

impl SystemMetrics {
    /// Create a new record with an empty chunk list.
    ///
    /// The ID is the fingerprint of `info` and doubles as the artifact prefix.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedSchema`] if `info.schema` is unknown.
    pub fn new(info: SystemMetricsInfo, options: ArtifactOptions) -> Result<Self> {
        let id = info.id()?;
        Ok(Self {
            artifact: ArtifactInfo {
                kind: options.kind,
                prefix: id.clone(),
                format: options.format,
                compression: options.compression,
                chunks: Vec::new(),
            },
            id,
            info,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    /// Get the record ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the identifying attributes.
    #[must_use]
    pub const fn info(&self) -> &SystemMetricsInfo {
        &self.info
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the completion timestamp, if the record was closed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Check if the record was closed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Get the artifact descriptor.
    #[must_use]
    pub const fn artifact(&self) -> &ArtifactInfo {
        &self.artifact
    }

    /// Get the number of stored chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.artifact.chunks.len()
    }

    /// Append a stored chunk key. Store backends call this inside their
    /// atomic update.
    pub fn push_chunk(&mut self, key: impl Into<String>) {
        self.artifact.chunks.push(key.into());
    }

    /// Mark the record completed at `at`.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SystemMetrics {
        SystemMetrics::new(
            SystemMetricsInfo {
                project: "test".to_string(),
                ..Default::default()
            },
            ArtifactOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_record_is_empty_and_open() {
        let sm = record();
        assert_eq!(sm.chunk_count(), 0);
        assert!(!sm.is_completed());
        assert!(sm.completed_at().is_none());
        assert!(sm.created_at().timestamp() > 0);
    }

    #[test]
    fn test_id_matches_info_and_prefix() {
        let sm = record();
        assert_eq!(sm.id(), sm.info().id().unwrap());
        assert_eq!(sm.artifact().prefix(), sm.id());
        assert_eq!(sm.artifact().kind(), BucketKind::Local);
    }

    #[test]
    fn test_new_with_unsupported_schema_fails() {
        let info = SystemMetricsInfo {
            schema: 7,
            ..Default::default()
        };
        assert!(SystemMetrics::new(info, ArtifactOptions::default()).is_err());
    }

    #[test]
    fn test_push_chunk_preserves_order() {
        let mut sm = record();
        let keys: Vec<String> = ["c", "a", "b"].iter().map(|s| sm.artifact().chunk_key(s)).collect();
        for key in &keys {
            sm.push_chunk(key.clone());
        }
        assert_eq!(sm.artifact().chunks(), keys.as_slice());
    }

    #[test]
    fn test_chunk_key_is_prefixed() {
        let sm = record();
        assert_eq!(sm.artifact().chunk_key("x-0"), format!("{}/x-0", sm.id()));
    }

    #[test]
    fn test_complete() {
        let mut sm = record();
        let now = Utc::now();
        sm.complete(now);
        assert_eq!(sm.completed_at(), Some(now));
        assert!(sm.is_completed());
    }

    #[test]
    fn test_serialization_roundtrip_keeps_chunks() {
        let mut sm = record();
        sm.push_chunk("k1");
        let json = serde_json::to_string(&sm).expect("serialization failed");
        let back: SystemMetrics = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(sm, back);
    }

    #[test]
    fn test_bucket_kind_names() {
        assert_eq!(BucketKind::Local.as_str(), "local");
        assert_eq!(BucketKind::S3.as_str(), "s3");
        assert_eq!(BucketKind::InMemory.as_str(), "in_memory");
    }
}
