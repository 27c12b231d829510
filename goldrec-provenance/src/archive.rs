//! Pre-merge snapshot archive.
//!
//! Source records are archived before anything irreversible happens during a
//! merge, and taken back out when the merge is reversed.

use async_trait::async_trait;
use goldrec_types::{RecordId, SourceRecord};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreResult;

/// Stores source record snapshots keyed by record id.
#[async_trait]
pub trait SourceRecordArchive<T>: Send + Sync {
    /// Archives `records` as the sources of `golden_record_id`. An id that is
    /// already archived is overwritten.
    async fn archive(
        &self,
        records: &[SourceRecord<T>],
        golden_record_id: &RecordId,
    ) -> StoreResult<()>;

    /// Returns the archived snapshots for `ids`, in request order.
    /// Missing ids are silently omitted; callers diff the result.
    async fn get(&self, ids: &[RecordId]) -> StoreResult<Vec<SourceRecord<T>>>;

    /// Removes the snapshots for `ids`. Missing ids are ignored.
    async fn remove(&self, ids: &[RecordId]) -> StoreResult<()>;

    /// Reports, for each requested id, whether a snapshot exists.
    async fn exists(&self, ids: &[RecordId]) -> StoreResult<BTreeMap<RecordId, bool>>;

    /// Returns every snapshot archived for `golden_record_id`.
    async fn get_by_golden_record(&self, golden_record_id: &RecordId)
    -> StoreResult<Vec<SourceRecord<T>>>;
}

#[derive(Debug, Clone)]
struct ArchiveEntry<T> {
    snapshot: SourceRecord<T>,
    golden_record_id: RecordId,
}

/// In-memory [`SourceRecordArchive`].
#[derive(Debug)]
pub struct InMemorySourceRecordArchive<T> {
    entries: RwLock<HashMap<RecordId, ArchiveEntry<T>>>,
}

impl<T> Default for InMemorySourceRecordArchive<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> InMemorySourceRecordArchive<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archived snapshots.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Golden record a snapshot was archived under.
    pub async fn golden_record_of(&self, id: &RecordId) -> Option<RecordId> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| e.golden_record_id.clone())
    }
}

#[async_trait]
impl<T> SourceRecordArchive<T> for InMemorySourceRecordArchive<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn archive(
        &self,
        records: &[SourceRecord<T>],
        golden_record_id: &RecordId,
    ) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        for record in records {
            entries.insert(
                record.id.clone(),
                ArchiveEntry {
                    snapshot: record.clone(),
                    golden_record_id: golden_record_id.clone(),
                },
            );
        }
        debug!(%golden_record_id, count = records.len(), "archived source records");
        Ok(())
    }

    async fn get(&self, ids: &[RecordId]) -> StoreResult<Vec<SourceRecord<T>>> {
        let entries = self.entries.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| entries.get(id))
            .map(|e| e.snapshot.clone())
            .collect())
    }

    async fn remove(&self, ids: &[RecordId]) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        for id in ids {
            entries.remove(id);
        }
        Ok(())
    }

    async fn exists(&self, ids: &[RecordId]) -> StoreResult<BTreeMap<RecordId, bool>> {
        let entries = self.entries.read().await;
        Ok(ids
            .iter()
            .map(|id| (id.clone(), entries.contains_key(id)))
            .collect())
    }

    async fn get_by_golden_record(
        &self,
        golden_record_id: &RecordId,
    ) -> StoreResult<Vec<SourceRecord<T>>> {
        let entries = self.entries.read().await;
        let mut found: Vec<SourceRecord<T>> = entries
            .values()
            .filter(|e| &e.golden_record_id == golden_record_id)
            .map(|e| e.snapshot.clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}
