//! Queue item data model.

use chrono::{DateTime, Utc};
use goldrec_types::{QueueItemId, RecordId, derive_record_id};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Reviewing,
    Confirmed,
    Rejected,
    Merged,
    Expired,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 6] = [
        Self::Pending,
        Self::Reviewing,
        Self::Confirmed,
        Self::Rejected,
        Self::Merged,
        Self::Expired,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Merged => "merged",
            Self::Expired => "expired",
        }
    }

    /// Statuses reachable from `self` in one step. Empty for terminal statuses.
    #[must_use]
    pub const fn allowed_transitions(&self) -> &'static [QueueStatus] {
        match self {
            Self::Pending => &[
                Self::Reviewing,
                Self::Confirmed,
                Self::Rejected,
                Self::Merged,
                Self::Expired,
            ],
            Self::Reviewing => &[
                Self::Confirmed,
                Self::Rejected,
                Self::Merged,
                Self::Pending,
                Self::Expired,
            ],
            Self::Confirmed | Self::Rejected | Self::Merged | Self::Expired => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(&self, to: QueueStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Terminal statuses reached through a reviewer decision.
    #[must_use]
    pub const fn requires_decision(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected | Self::Merged)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the reviewer decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Confirm,
    Reject,
    Merge,
}

impl DecisionAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::Merge => "merge",
        }
    }

    /// Status the queue item ends in after this decision.
    #[must_use]
    pub const fn resulting_status(&self) -> QueueStatus {
        match self {
            Self::Confirm => QueueStatus::Confirmed,
            Self::Reject => QueueStatus::Rejected,
            Self::Merge => QueueStatus::Merged,
        }
    }

    /// Whether the decision must name one of the potential matches.
    #[must_use]
    pub const fn requires_match(&self) -> bool {
        matches!(self, Self::Confirm | Self::Merge)
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's decision on a queue item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDecision {
    pub action: DecisionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_match_id: Option<RecordId>,
    /// Reviewer confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

impl QueueDecision {
    pub fn new(action: DecisionAction) -> Self {
        Self {
            action,
            selected_match_id: None,
            confidence: None,
            notes: None,
            decided_by: None,
        }
    }

    pub fn confirm(match_id: impl Into<RecordId>) -> Self {
        Self::new(DecisionAction::Confirm).with_match(match_id)
    }

    pub fn reject() -> Self {
        Self::new(DecisionAction::Reject)
    }

    pub fn merge(match_id: impl Into<RecordId>) -> Self {
        Self::new(DecisionAction::Merge).with_match(match_id)
    }

    #[must_use]
    pub fn with_match(mut self, match_id: impl Into<RecordId>) -> Self {
        self.selected_match_id = Some(match_id.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn decided_by(mut self, reviewer: impl Into<String>) -> Self {
        self.decided_by = Some(reviewer.into());
        self
    }
}

/// Outcome tag carried by every potential match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    #[default]
    #[serde(rename = "potential-match")]
    PotentialMatch,
}

/// A scored candidate the external matcher could not decide on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialMatch<T> {
    pub record: T,
    pub score: f64,
    #[serde(default)]
    pub outcome: MatchOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl<T> PotentialMatch<T> {
    pub fn new(record: T, score: f64) -> Self {
        Self {
            record,
            score,
            outcome: MatchOutcome::PotentialMatch,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

impl<T: Serialize> PotentialMatch<T> {
    /// Id of the matched record, read from `id_field`.
    pub fn record_id(&self, id_field: &str) -> Option<RecordId> {
        record_id_of(&self.record, id_field)
    }
}

/// A human-review unit: one candidate and its potential matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem<T> {
    pub id: QueueItemId,
    pub candidate_record: T,
    pub potential_matches: Vec<PotentialMatch<T>>,
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<QueueDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl<T> QueueItem<T> {
    /// Creates a pending item with a fresh id.
    pub fn new(
        candidate_record: T,
        potential_matches: Vec<PotentialMatch<T>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: QueueItemId::new(),
            candidate_record,
            potential_matches,
            status: QueueStatus::Pending,
            created_at: now,
            updated_at: now,
            decided_at: None,
            decided_by: None,
            decision: None,
            priority: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<QueueItemId>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, update: &QueueItemUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(decision) = &update.decision {
            self.decision = Some(decision.clone());
        }
        if let Some(decided_at) = update.decided_at {
            self.decided_at = Some(decided_at);
        }
        if let Some(decided_by) = &update.decided_by {
            self.decided_by = Some(decided_by.clone());
        }
        if let Some(priority) = update.priority {
            self.priority = Some(priority);
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        self.updated_at = update.updated_at;
    }
}

impl<T: Serialize> QueueItem<T> {
    /// Id of the candidate record, read from `id_field`.
    pub fn candidate_id(&self, id_field: &str) -> Option<RecordId> {
        record_id_of(&self.candidate_record, id_field)
    }

    /// Ids of every potential match that has one, in match order.
    pub fn match_ids(&self, id_field: &str) -> Vec<RecordId> {
        self.potential_matches
            .iter()
            .filter_map(|m| m.record_id(id_field))
            .collect()
    }

    /// The potential match whose record id equals `match_id`.
    pub fn find_match(&self, match_id: &RecordId, id_field: &str) -> Option<&PotentialMatch<T>> {
        self.potential_matches
            .iter()
            .find(|m| m.record_id(id_field).as_ref() == Some(match_id))
    }
}

/// Partial update of a queue item. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemUpdate {
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QueueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<QueueDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl QueueItemUpdate {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            status: None,
            decision: None,
            decided_at: None,
            decided_by: None,
            priority: None,
            tags: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: QueueStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Records `decision`, stamped at the update time.
    #[must_use]
    pub fn decision(mut self, decision: QueueDecision) -> Self {
        self.decided_by = decision.decided_by.clone();
        self.decided_at = Some(self.updated_at);
        self.decision = Some(decision);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Reads a record id from any serializable payload.
pub fn record_id_of<T: Serialize>(record: &T, id_field: &str) -> Option<RecordId> {
    serde_json::to_value(record)
        .ok()
        .and_then(|v| derive_record_id(&v, id_field))
}
