use goldrec_types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MergeStrategy;

/// Whether a recorded conflict was settled by its strategy or left for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictState {
    Resolved,
    Deferred,
}

/// One source's value for a conflicting field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictValue {
    pub source_record_id: RecordId,
    pub value: Value,
}

/// A field on which the source records disagreed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    pub field: String,
    pub source_values: Vec<ConflictValue>,
    pub resolution: ConflictState,
    pub strategy: MergeStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_value: Option<Value>,
}

impl MergeConflict {
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.resolution == ConflictState::Deferred
    }
}
