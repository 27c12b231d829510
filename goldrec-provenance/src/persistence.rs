//! Storage-layer callbacks invoked around merge and unmerge.

use async_trait::async_trait;
use goldrec_types::{RecordId, SourceRecord};

use crate::error::StoreResult;

/// Hooks into the caller's record storage.
///
/// Every method is optional; the defaults do nothing. Implement only the
/// steps your storage layer needs to observe.
#[async_trait]
pub trait RecordPersistence<T: Sync>: Send + Sync {
    /// Persist a freshly merged golden record. A failure aborts the merge.
    async fn create_golden_record(
        &self,
        record: &T,
        golden_record_id: &RecordId,
    ) -> StoreResult<()> {
        let _ = (record, golden_record_id);
        Ok(())
    }

    /// Retire merged source records at the storage layer.
    async fn archive_source_records(&self, source_record_ids: &[RecordId]) -> StoreResult<()> {
        let _ = source_record_ids;
        Ok(())
    }

    /// Write a source record back during unmerge.
    async fn restore_record(&self, record: &SourceRecord<T>) -> StoreResult<()> {
        let _ = record;
        Ok(())
    }

    /// Remove a golden record during unmerge.
    async fn delete_golden_record(&self, golden_record_id: &RecordId) -> StoreResult<()> {
        let _ = golden_record_id;
        Ok(())
    }
}
