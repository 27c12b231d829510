//! Reversal of a committed merge.
//!
//! Source records come back from the archive, are handed to the storage
//! layer, and the provenance is flagged as unmerged. Every precondition is
//! checked before the first side effect, and the archive is only emptied
//! once every restore has succeeded.

use goldrec_model::{Provenance, UnmergeInfo};
use goldrec_types::{Clock, RecordId, SourceRecord, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::archive::SourceRecordArchive;
use crate::error::{UnmergeError, UnmergeResult};
use crate::persistence::RecordPersistence;
use crate::store::ProvenanceStore;

/// Which sources an unmerge restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnmergeMode {
    /// Restore every source; the golden record is deleted by default.
    #[default]
    Full,
    /// Restore a subset; the golden record is kept by default.
    Partial,
    /// Split a subset off into standalone records; the golden record is kept by default.
    Split,
}

impl UnmergeMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::Split => "split",
        }
    }

    /// Whether the golden record is deleted when the caller does not say.
    #[must_use]
    pub const fn deletes_golden_record_by_default(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Who is reversing which merge, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmergeRequest {
    pub golden_record_id: RecordId,
    pub unmerged_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UnmergeRequest {
    pub fn new(golden_record_id: impl Into<RecordId>, unmerged_by: impl Into<String>) -> Self {
        Self {
            golden_record_id: golden_record_id.into(),
            unmerged_by: unmerged_by.into(),
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// How an unmerge is carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmergeOptions {
    #[serde(default)]
    pub mode: UnmergeMode,
    /// Required and non-empty for `partial` and `split`; ignored for `full`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_record_ids_to_restore: Option<Vec<RecordId>>,
    /// Overrides the mode's default golden-record deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_golden_record: Option<bool>,
}

impl UnmergeOptions {
    /// Full unmerge with mode defaults.
    pub fn full() -> Self {
        Self::default()
    }

    /// Partial unmerge of `ids`.
    pub fn partial(ids: Vec<RecordId>) -> Self {
        Self {
            mode: UnmergeMode::Partial,
            source_record_ids_to_restore: Some(ids),
            delete_golden_record: None,
        }
    }

    /// Split `ids` off the golden record.
    pub fn split(ids: Vec<RecordId>) -> Self {
        Self {
            mode: UnmergeMode::Split,
            source_record_ids_to_restore: Some(ids),
            delete_golden_record: None,
        }
    }

    #[must_use]
    pub fn delete_golden_record(mut self, delete: bool) -> Self {
        self.delete_golden_record = Some(delete);
        self
    }
}

/// Output of a successful unmerge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmergeOutcome<T> {
    pub restored_records: Vec<SourceRecord<T>>,
    /// Provenance as it was before this unmerge.
    pub original_provenance: Provenance,
    pub golden_record_deleted: bool,
    /// Sources of the merge that were not restored.
    pub remaining_source_record_ids: Vec<RecordId>,
}

/// Answer of [`UnmergeExecutor::can_unmerge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmergeCheck {
    pub can_unmerge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UnmergeCheck {
    fn allowed() -> Self {
        Self {
            can_unmerge: true,
            reason: None,
        }
    }

    fn denied(reason: String) -> Self {
        Self {
            can_unmerge: false,
            reason: Some(reason),
        }
    }
}

/// Reverses merges using the provenance store and the source archive.
pub struct UnmergeExecutor<T> {
    provenance_store: Arc<dyn ProvenanceStore>,
    archive: Arc<dyn SourceRecordArchive<T>>,
    persistence: Option<Arc<dyn RecordPersistence<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T> UnmergeExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        provenance_store: Arc<dyn ProvenanceStore>,
        archive: Arc<dyn SourceRecordArchive<T>>,
    ) -> Self {
        Self {
            provenance_store,
            archive,
            persistence: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the storage callbacks invoked for restores and deletions.
    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn RecordPersistence<T>>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Replaces the clock used for `unmergedAt`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reverses the merge that produced `request.golden_record_id`.
    pub async fn unmerge(
        &self,
        request: &UnmergeRequest,
        options: &UnmergeOptions,
    ) -> UnmergeResult<UnmergeOutcome<T>> {
        let golden_record_id = &request.golden_record_id;
        let provenance = self.load_mergeable(golden_record_id).await?;
        let targets = target_ids(&provenance, options)?;

        let missing = self.missing_from_archive(&targets).await?;
        if !missing.is_empty() {
            return Err(UnmergeError::SourceRecordsNotFound {
                golden_record_id: golden_record_id.clone(),
                missing,
            });
        }

        let restored = self.archive.get(&targets).await?;
        if restored.len() != targets.len() {
            let missing = targets
                .iter()
                .filter(|id| !restored.iter().any(|r| &r.id == *id))
                .cloned()
                .collect();
            return Err(UnmergeError::SourceRecordsNotFound {
                golden_record_id: golden_record_id.clone(),
                missing,
            });
        }

        debug!(
            %golden_record_id,
            mode = options.mode.as_str(),
            count = restored.len(),
            "restoring source records"
        );
        if let Some(persistence) = &self.persistence {
            for record in &restored {
                persistence
                    .restore_record(record)
                    .await
                    .map_err(|source| UnmergeError::Callback {
                        operation: "restore_record",
                        source,
                    })?;
            }
        }

        let delete_golden = options
            .delete_golden_record
            .unwrap_or_else(|| options.mode.deletes_golden_record_by_default());
        if delete_golden {
            if let Some(persistence) = &self.persistence {
                persistence
                    .delete_golden_record(golden_record_id)
                    .await
                    .map_err(|source| UnmergeError::Callback {
                        operation: "delete_golden_record",
                        source,
                    })?;
            }
        }

        self.archive.remove(&targets).await?;

        let info = UnmergeInfo {
            unmerged_at: self.clock.now(),
            unmerged_by: request.unmerged_by.clone(),
            reason: request.reason.clone(),
        };
        self.provenance_store
            .mark_unmerged(golden_record_id, &info)
            .await?;

        let remaining_source_record_ids = provenance
            .source_record_ids
            .iter()
            .filter(|id| !targets.contains(id))
            .cloned()
            .collect();

        info!(
            %golden_record_id,
            mode = options.mode.as_str(),
            restored = restored.len(),
            golden_record_deleted = delete_golden,
            "unmerge complete"
        );

        Ok(UnmergeOutcome {
            restored_records: restored,
            original_provenance: provenance,
            golden_record_deleted: delete_golden,
            remaining_source_record_ids,
        })
    }

    /// Read-only check: would a full unmerge of `golden_record_id` pass its
    /// preconditions right now?
    pub async fn can_unmerge(&self, golden_record_id: &RecordId) -> UnmergeResult<UnmergeCheck> {
        let provenance = match self.load_mergeable(golden_record_id).await {
            Ok(p) => p,
            Err(
                e @ (UnmergeError::ProvenanceNotFound { .. }
                | UnmergeError::AlreadyUnmerged { .. }),
            ) => {
                return Ok(UnmergeCheck::denied(describe_denial(&e)));
            }
            Err(e) => return Err(e),
        };
        let missing = self.missing_from_archive(&provenance.source_record_ids).await?;
        if !missing.is_empty() {
            return Ok(UnmergeCheck::denied(format!(
                "source records missing from archive: {}",
                join_ids(&missing)
            )));
        }
        Ok(UnmergeCheck::allowed())
    }

    async fn load_mergeable(&self, golden_record_id: &RecordId) -> UnmergeResult<Provenance> {
        let provenance = self
            .provenance_store
            .get(golden_record_id)
            .await?
            .ok_or_else(|| UnmergeError::ProvenanceNotFound {
                golden_record_id: golden_record_id.clone(),
            })?;
        if provenance.unmerged {
            return Err(UnmergeError::AlreadyUnmerged {
                golden_record_id: golden_record_id.clone(),
                unmerged_at: provenance.unmerged_at,
                unmerged_by: provenance.unmerged_by.clone(),
            });
        }
        Ok(provenance)
    }

    async fn missing_from_archive(&self, ids: &[RecordId]) -> UnmergeResult<Vec<RecordId>> {
        let present = self.archive.exists(ids).await?;
        Ok(ids
            .iter()
            .filter(|id| !present.get(*id).copied().unwrap_or(false))
            .cloned()
            .collect())
    }
}

/// Resolves which source ids an unmerge restores, before any archive access.
fn target_ids(provenance: &Provenance, options: &UnmergeOptions) -> UnmergeResult<Vec<RecordId>> {
    if options.mode == UnmergeMode::Full {
        return Ok(provenance.source_record_ids.clone());
    }
    let requested = options
        .source_record_ids_to_restore
        .as_deref()
        .unwrap_or_default();
    if requested.is_empty() {
        return Err(UnmergeError::InvalidRequest {
            reason: format!(
                "{} unmerge requires a non-empty sourceRecordIdsToRestore",
                options.mode.as_str()
            ),
        });
    }
    let mut targets: Vec<RecordId> = Vec::with_capacity(requested.len());
    for id in requested {
        if !provenance.contains_source(id) {
            return Err(UnmergeError::InvalidRequest {
                reason: format!(
                    "record '{id}' is not a source of golden record '{}'",
                    provenance.golden_record_id
                ),
            });
        }
        if !targets.contains(id) {
            targets.push(id.clone());
        }
    }
    Ok(targets)
}

fn describe_denial(error: &UnmergeError) -> String {
    match error {
        UnmergeError::AlreadyUnmerged {
            golden_record_id,
            unmerged_at,
            unmerged_by,
        } => {
            let mut reason = format!("golden record '{golden_record_id}' was already unmerged");
            if let Some(at) = unmerged_at {
                reason.push_str(&format!(" at {}", at.to_rfc3339()));
            }
            if let Some(by) = unmerged_by {
                reason.push_str(&format!(" by {by}"));
            }
            reason
        }
        other => other.to_string(),
    }
}

fn join_ids(ids: &[RecordId]) -> String {
    ids.iter().map(RecordId::as_str).collect::<Vec<_>>().join(", ")
}
