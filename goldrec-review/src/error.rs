//! Error types for review queue operations.

use goldrec_merge::MergeError;
use goldrec_provenance::StoreError;
use goldrec_types::{QueueItemId, RecordId};
use thiserror::Error;

use crate::item::QueueStatus;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors raised by the review queue and the merge-decision handler.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue item does not exist.
    #[error("queue item not found: {id}")]
    ItemNotFound { id: QueueItemId },

    /// The requested status change is not in the transition table.
    #[error("cannot move queue item from {from} to {to}: {}", allowed_hint(.allowed))]
    InvalidStatusTransition {
        from: QueueStatus,
        to: QueueStatus,
        allowed: Vec<QueueStatus>,
    },

    /// A queue operation could not be carried out.
    #[error("queue operation '{operation}' failed: {reason}")]
    OperationFailed {
        operation: &'static str,
        reason: String,
    },

    /// Queue data or a decision is incomplete or out of range.
    #[error("invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// The decision selects a match the queue item does not carry.
    #[error(
        "match '{match_id}' is not a potential match of queue item '{queue_item_id}' (available: {})",
        join_ids(.available)
    )]
    MatchNotFound {
        queue_item_id: QueueItemId,
        match_id: RecordId,
        available: Vec<RecordId>,
    },

    /// A persistence callback failed after the merge was computed.
    #[error("{operation} callback failed: {source}")]
    Callback {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Archive or provenance store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueueError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ItemNotFound { .. } => "QUEUE_ITEM_NOT_FOUND",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::OperationFailed { .. } => "QUEUE_OPERATION_FAILED",
            Self::Validation { .. } => "QUEUE_VALIDATION_ERROR",
            Self::MatchNotFound { .. } => "MATCH_NOT_FOUND",
            Self::Callback { .. } => "CALLBACK_FAILED",
            Self::Merge(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

fn allowed_hint(allowed: &[QueueStatus]) -> String {
    if allowed.is_empty() {
        return "it is in a final state".to_string();
    }
    let names: Vec<&str> = allowed.iter().map(QueueStatus::as_str).collect();
    format!("allowed targets are [{}]", names.join(", "))
}

fn join_ids(ids: &[RecordId]) -> String {
    ids.iter().map(RecordId::as_str).collect::<Vec<_>>().join(", ")
}
