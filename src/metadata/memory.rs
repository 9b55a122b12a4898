//! In-memory metadata store implementation using `DashMap`.
//!
//! Data is lost on process restart; use `FileMetadataStore` for persistence.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::MetadataStore;
use crate::model::SystemMetrics;
use crate::{Error, Result};

/// In-memory record store using lock-free concurrent hashmap.
///
/// Updates go through `DashMap::get_mut`, which holds the shard lock for the
/// record while it is modified, so appends are atomic per record.
#[derive(Debug)]
pub struct MemoryMetadataStore {
    records: DashMap<String, SystemMetrics>,
}

impl MemoryMetadataStore {
    /// Create a new in-memory metadata store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Get the number of records in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.records.clear();
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut SystemMetrics)) -> Result<()> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        apply(record.value_mut());
        Ok(())
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for MemoryMetadataStore {
    async fn load(&self, id: &str) -> Result<SystemMetrics> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    async fn save(&self, record: &SystemMetrics) -> Result<()> {
        match self.records.entry(record.id().to_string()) {
            Entry::Occupied(_) => Err(Error::RecordExists(record.id().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn append_chunk(&self, id: &str, chunk_key: &str) -> Result<()> {
        self.update(id, |record| record.push_chunk(chunk_key))
    }

    async fn mark_completed(&self, id: &str, completed_at: DateTime<Utc>) -> Result<()> {
        self.update(id, |record| record.complete(completed_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactOptions, SystemMetricsInfo};

    #[tokio::test]
    async fn test_len_and_clear() {
        let store = MemoryMetadataStore::default();
        assert!(store.is_empty());

        let sm = SystemMetrics::new(SystemMetricsInfo::default(), ArtifactOptions::default()).unwrap();
        store.save(&sm).await.unwrap();
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
