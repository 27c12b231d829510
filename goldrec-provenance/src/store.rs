//! Provenance persistence.

use async_trait::async_trait;
use goldrec_model::{Provenance, UnmergeInfo};
use goldrec_types::RecordId;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};

/// Persists the provenance of golden records.
#[async_trait]
pub trait ProvenanceStore: Send + Sync {
    /// Returns the current provenance of a golden record.
    async fn get(&self, golden_record_id: &RecordId) -> StoreResult<Option<Provenance>>;

    /// Stores provenance for a new merge. A re-merge under the same golden
    /// record id supersedes the previous provenance.
    async fn save(&self, provenance: &Provenance) -> StoreResult<()>;

    /// Flags the current provenance as unmerged. Fails when none exists or
    /// it is already unmerged.
    async fn mark_unmerged(&self, golden_record_id: &RecordId, info: &UnmergeInfo)
    -> StoreResult<()>;

    /// Returns every current provenance that lists `source_record_id` as a source.
    async fn find_by_source_record(&self, source_record_id: &RecordId)
    -> StoreResult<Vec<Provenance>>;

    /// Returns all provenance ever saved for a golden record, oldest first.
    async fn history(&self, golden_record_id: &RecordId) -> StoreResult<Vec<Provenance>>;
}

/// In-memory [`ProvenanceStore`] keeping every saved version.
#[derive(Debug, Default)]
pub struct InMemoryProvenanceStore {
    entries: RwLock<HashMap<RecordId, Vec<Provenance>>>,
}

impl InMemoryProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of golden records with provenance.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ProvenanceStore for InMemoryProvenanceStore {
    async fn get(&self, golden_record_id: &RecordId) -> StoreResult<Option<Provenance>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(golden_record_id)
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn save(&self, provenance: &Provenance) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries
            .entry(provenance.golden_record_id.clone())
            .or_default()
            .push(provenance.clone());
        Ok(())
    }

    async fn mark_unmerged(
        &self,
        golden_record_id: &RecordId,
        info: &UnmergeInfo,
    ) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        let current = entries
            .get_mut(golden_record_id)
            .and_then(|versions| versions.last_mut())
            .ok_or_else(|| StoreError::NotFound(format!("provenance for {golden_record_id}")))?;
        if !current.mark_unmerged(info) {
            return Err(StoreError::Conflict(format!(
                "provenance for {golden_record_id} is already unmerged"
            )));
        }
        Ok(())
    }

    async fn find_by_source_record(
        &self,
        source_record_id: &RecordId,
    ) -> StoreResult<Vec<Provenance>> {
        let entries = self.entries.read().await;
        let mut found: Vec<Provenance> = entries
            .values()
            .filter_map(|versions| versions.last())
            .filter(|p| p.contains_source(source_record_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.golden_record_id.cmp(&b.golden_record_id));
        Ok(found)
    }

    async fn history(&self, golden_record_id: &RecordId) -> StoreResult<Vec<Provenance>> {
        let entries = self.entries.read().await;
        Ok(entries.get(golden_record_id).cloned().unwrap_or_default())
    }
}
