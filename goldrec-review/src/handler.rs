//! Turns a reviewer's merge decision into a committed, reversible merge.
//!
//! Order of effects:
//!
//! 1. Check the decision, the item status and the selected match (no side
//!    effects before this succeeds)
//! 2. Merge candidate and match
//! 3. Archive both pre-merge snapshots
//! 4. Persist the golden record, then retire the sources (optional callbacks)
//! 5. Save provenance
//! 6. Mark the queue item `merged`
//!
//! Archiving precedes every irreversible step. A failure in step 6 is
//! logged and reported through [`QueueMergeOutcome::queue_item_updated`];
//! the merge itself stays committed.

use chrono::{DateTime, Utc};
use goldrec_merge::{MergeExecutor, MergeOutcome, MergeRequest};
use goldrec_provenance::{ProvenanceStore, RecordPersistence, SourceRecordArchive};
use goldrec_types::path::get_path;
use goldrec_types::{Clock, QueueItemId, RecordId, SourceRecord, SystemClock, parse_timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::QueueAdapter;
use crate::error::{QueueError, QueueResult};
use crate::item::{DecisionAction, QueueDecision, QueueItem, QueueItemUpdate, QueueStatus};
use crate::state;

/// Payload field read for record ids unless configured otherwise.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Payload field whose timestamp is kept as a source's `createdAt`.
const CREATED_AT_FIELD: &str = "createdAt";

/// Actor recorded in provenance when the decision names no reviewer.
const SYSTEM_ACTOR: &str = "system";

/// Result of a merge decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMergeOutcome<T> {
    #[serde(flatten)]
    pub merge: MergeOutcome<T>,
    pub queue_item_id: QueueItemId,
    /// False when the merge committed but the queue item could not be
    /// marked `merged`. The item then needs reconciliation.
    pub queue_item_updated: bool,
}

/// Orchestrates merge decisions coming out of the review queue.
pub struct QueueMergeHandler<T> {
    executor: Arc<MergeExecutor>,
    archive: Arc<dyn SourceRecordArchive<T>>,
    provenance_store: Arc<dyn ProvenanceStore>,
    queue: Arc<dyn QueueAdapter<T>>,
    persistence: Option<Arc<dyn RecordPersistence<T>>>,
    clock: Arc<dyn Clock>,
    id_field: String,
}

impl<T> QueueMergeHandler<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        executor: Arc<MergeExecutor>,
        archive: Arc<dyn SourceRecordArchive<T>>,
        provenance_store: Arc<dyn ProvenanceStore>,
        queue: Arc<dyn QueueAdapter<T>>,
    ) -> Self {
        Self {
            executor,
            archive,
            provenance_store,
            queue,
            persistence: None,
            clock: Arc::new(SystemClock),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn RecordPersistence<T>>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reads record ids from `field` instead of `id`.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Pre-flight check mirroring [`state::can_merge`].
    pub fn can_merge(&self, item: &QueueItem<T>, selected_match_id: &RecordId) -> bool {
        state::can_merge(item, selected_match_id, &self.id_field)
    }

    /// Merges the candidate of `item` with the match selected by `decision`.
    pub async fn handle_merge_decision(
        &self,
        item: &QueueItem<T>,
        decision: &QueueDecision,
    ) -> QueueResult<QueueMergeOutcome<T>> {
        let match_id = decision.selected_match_id.as_ref().ok_or_else(|| {
            QueueError::validation("selectedMatchId", "required for a merge decision")
        })?;
        if decision.action != DecisionAction::Merge {
            return Err(QueueError::validation(
                "action",
                format!("expected a merge decision, got {}", decision.action),
            ));
        }
        state::validate_status_transition(item.status, QueueStatus::Merged)?;
        state::validate_decision(decision)?;

        let selected = item
            .find_match(match_id, &self.id_field)
            .ok_or_else(|| QueueError::MatchNotFound {
                queue_item_id: item.id.clone(),
                match_id: match_id.clone(),
                available: item.match_ids(&self.id_field),
            })?;
        let golden_record_id = item.candidate_id(&self.id_field).ok_or_else(|| {
            QueueError::validation(
                format!("candidateRecord.{}", self.id_field),
                "candidate record carries no id",
            )
        })?;

        let now = self.clock.now();
        let sources = vec![
            self.source_record(golden_record_id.clone(), &item.candidate_record, now)?,
            self.source_record(match_id.clone(), &selected.record, now)?,
        ];
        let source_ids: Vec<RecordId> = sources.iter().map(|s| s.id.clone()).collect();

        debug!(queue_item_id = %item.id, %golden_record_id, %match_id, "handling merge decision");
        let request = MergeRequest {
            source_records: sources,
            golden_record_id: golden_record_id.clone(),
            merged_by: decision
                .decided_by
                .clone()
                .unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
        };
        let outcome = self
            .executor
            .merge_with_id_field(&request, &self.id_field)?;

        self.archive
            .archive(&request.source_records, &golden_record_id)
            .await?;

        if let Some(persistence) = &self.persistence {
            persistence
                .create_golden_record(&outcome.golden_record, &golden_record_id)
                .await
                .map_err(|source| QueueError::Callback {
                    operation: "create_golden_record",
                    source,
                })?;
            persistence
                .archive_source_records(&source_ids)
                .await
                .map_err(|source| QueueError::Callback {
                    operation: "archive_source_records",
                    source,
                })?;
        }

        self.provenance_store.save(&outcome.provenance).await?;

        let update = QueueItemUpdate::at(now)
            .status(QueueStatus::Merged)
            .decision(decision.clone());
        let queue_item_updated = match self.queue.update_queue_item(&item.id, &update).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    queue_item_id = %item.id,
                    %golden_record_id,
                    error = %e,
                    "merge committed but queue item update failed"
                );
                false
            }
        };

        info!(
            queue_item_id = %item.id,
            %golden_record_id,
            conflicts = outcome.conflicts.len(),
            queue_item_updated,
            "merge decision applied"
        );

        Ok(QueueMergeOutcome {
            merge: outcome,
            queue_item_id: item.id.clone(),
            queue_item_updated,
        })
    }

    /// Snapshot of `record` as a merge source. A `createdAt` in the payload
    /// is kept; otherwise the record counts as created `now`.
    fn source_record(
        &self,
        id: RecordId,
        record: &T,
        now: DateTime<Utc>,
    ) -> QueueResult<SourceRecord<T>> {
        let payload = serde_json::to_value(record)?;
        let created_at = get_path(&payload, CREATED_AT_FIELD)
            .and_then(parse_timestamp)
            .unwrap_or(now);
        Ok(SourceRecord::new(id, record.clone(), created_at, now))
    }
}
