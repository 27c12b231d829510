//! Review queue service.

use chrono::{DateTime, Utc};
use goldrec_types::{Clock, QueueItemId, SystemClock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapter::QueueAdapter;
use crate::error::{QueueError, QueueResult};
use crate::handler::{DEFAULT_ID_FIELD, QueueMergeHandler, QueueMergeOutcome};
use crate::item::{
    DecisionAction, PotentialMatch, QueueDecision, QueueItem, QueueItemUpdate, QueueStatus,
};
use crate::state;

/// Item counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub reviewing: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub merged: usize,
    pub expired: usize,
}

impl QueueStats {
    fn count(&mut self, status: QueueStatus) {
        self.total += 1;
        let slot = match status {
            QueueStatus::Pending => &mut self.pending,
            QueueStatus::Reviewing => &mut self.reviewing,
            QueueStatus::Confirmed => &mut self.confirmed,
            QueueStatus::Rejected => &mut self.rejected,
            QueueStatus::Merged => &mut self.merged,
            QueueStatus::Expired => &mut self.expired,
        };
        *slot += 1;
    }

    /// Items still awaiting a decision.
    #[must_use]
    pub const fn open(&self) -> usize {
        self.pending + self.reviewing
    }
}

/// Human-review queue over a [`QueueAdapter`].
///
/// Every status change goes through the transition table. Merge decisions
/// are delegated to a [`QueueMergeHandler`].
pub struct ReviewQueue<T> {
    adapter: Arc<dyn QueueAdapter<T>>,
    merge_handler: Option<Arc<QueueMergeHandler<T>>>,
    clock: Arc<dyn Clock>,
    id_field: String,
}

impl<T> ReviewQueue<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(adapter: Arc<dyn QueueAdapter<T>>) -> Self {
        Self {
            adapter,
            merge_handler: None,
            clock: Arc::new(SystemClock),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    /// Enables [`ReviewQueue::merge`]. The handler's id field is adopted.
    #[must_use]
    pub fn with_merge_handler(mut self, handler: Arc<QueueMergeHandler<T>>) -> Self {
        self.id_field = handler.id_field().to_string();
        self.merge_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Validates and stores an item.
    pub async fn add(&self, item: QueueItem<T>) -> QueueResult<QueueItem<T>> {
        state::validate_queue_item(&item)?;
        self.adapter.insert_queue_item(&item).await?;
        debug!(
            queue_item_id = %item.id,
            matches = item.potential_matches.len(),
            "queue item added"
        );
        Ok(item)
    }

    /// Creates a pending item for `candidate` and stores it.
    pub async fn enqueue(
        &self,
        candidate: T,
        potential_matches: Vec<PotentialMatch<T>>,
    ) -> QueueResult<QueueItem<T>> {
        self.add(QueueItem::new(candidate, potential_matches, self.clock.now()))
            .await
    }

    pub async fn get(&self, id: &QueueItemId) -> QueueResult<QueueItem<T>> {
        self.adapter
            .get_queue_item(id)
            .await?
            .ok_or_else(|| QueueError::ItemNotFound { id: id.clone() })
    }

    pub async fn list(&self, status: Option<QueueStatus>) -> QueueResult<Vec<QueueItem<T>>> {
        self.adapter.list_queue_items(status).await
    }

    /// Moves an item into review.
    pub async fn start_review(&self, id: &QueueItemId) -> QueueResult<QueueItem<T>> {
        self.transition(id, QueueStatus::Reviewing).await
    }

    /// Hands an item under review back to the queue.
    pub async fn return_to_pending(&self, id: &QueueItemId) -> QueueResult<QueueItem<T>> {
        self.transition(id, QueueStatus::Pending).await
    }

    /// Records that the candidate matches the selected record, without merging.
    pub async fn confirm(
        &self,
        id: &QueueItemId,
        decision: QueueDecision,
    ) -> QueueResult<QueueItem<T>> {
        self.decide(id, decision, DecisionAction::Confirm).await
    }

    /// Records that none of the potential matches is the candidate.
    pub async fn reject(
        &self,
        id: &QueueItemId,
        decision: QueueDecision,
    ) -> QueueResult<QueueItem<T>> {
        self.decide(id, decision, DecisionAction::Reject).await
    }

    /// Merges the candidate with the selected match.
    pub async fn merge(
        &self,
        id: &QueueItemId,
        decision: QueueDecision,
    ) -> QueueResult<QueueMergeOutcome<T>> {
        let handler = self
            .merge_handler
            .as_ref()
            .ok_or_else(|| QueueError::OperationFailed {
                operation: "merge",
                reason: "no merge handler configured".to_string(),
            })?;
        expect_action(&decision, DecisionAction::Merge)?;
        let item = self.get(id).await?;
        handler.handle_merge_decision(&item, &decision).await
    }

    /// Expires every open item created before `cutoff`. Returns the expired ids.
    pub async fn expire_older_than(&self, cutoff: DateTime<Utc>) -> QueueResult<Vec<QueueItemId>> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        for item in self.adapter.list_queue_items(None).await? {
            if item.created_at >= cutoff || !item.status.can_transition_to(QueueStatus::Expired) {
                continue;
            }
            let update = QueueItemUpdate::at(now).status(QueueStatus::Expired);
            self.adapter.update_queue_item(&item.id, &update).await?;
            expired.push(item.id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), %cutoff, "expired stale queue items");
        }
        Ok(expired)
    }

    pub async fn stats(&self) -> QueueResult<QueueStats> {
        let mut stats = QueueStats::default();
        for item in self.adapter.list_queue_items(None).await? {
            stats.count(item.status);
        }
        Ok(stats)
    }

    async fn transition(&self, id: &QueueItemId, to: QueueStatus) -> QueueResult<QueueItem<T>> {
        let item = self.get(id).await?;
        state::validate_status_transition(item.status, to)?;
        let update = QueueItemUpdate::at(self.clock.now()).status(to);
        let updated = self.adapter.update_queue_item(id, &update).await?;
        debug!(queue_item_id = %id, from = %item.status, %to, "queue item status changed");
        Ok(updated)
    }

    async fn decide(
        &self,
        id: &QueueItemId,
        decision: QueueDecision,
        action: DecisionAction,
    ) -> QueueResult<QueueItem<T>> {
        expect_action(&decision, action)?;
        let item = self.get(id).await?;
        let to = action.resulting_status();
        state::validate_status_transition(item.status, to)?;

        if let Some(match_id) = &decision.selected_match_id {
            if item.find_match(match_id, &self.id_field).is_none() {
                return Err(QueueError::MatchNotFound {
                    queue_item_id: item.id.clone(),
                    match_id: match_id.clone(),
                    available: item.match_ids(&self.id_field),
                });
            }
        }

        let update = QueueItemUpdate::at(self.clock.now())
            .status(to)
            .decision(decision);
        let updated = self.adapter.update_queue_item(id, &update).await?;
        info!(queue_item_id = %id, action = action.as_str(), "queue decision recorded");
        Ok(updated)
    }
}

fn expect_action(decision: &QueueDecision, action: DecisionAction) -> QueueResult<()> {
    if decision.action != action {
        return Err(QueueError::validation(
            "action",
            format!("expected a {action} decision, got {}", decision.action),
        ));
    }
    state::validate_decision(decision)
}
