use chrono::{DateTime, Utc};
use goldrec_types::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::MergeStrategy;

/// Where one golden-record field came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSource {
    pub source_record_id: RecordId,
    pub strategy: MergeStrategy,
    /// Sources disagreed on this field.
    #[serde(default)]
    pub had_conflict: bool,
}

/// Audit data written when a golden record is unmerged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmergeInfo {
    pub unmerged_at: DateTime<Utc>,
    pub unmerged_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The record of how a golden record was assembled.
///
/// Created once at merge time and changed at most once afterwards, by
/// [`Provenance::mark_unmerged`]. A re-merge creates a new provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub golden_record_id: RecordId,
    pub source_record_ids: Vec<RecordId>,
    pub field_sources: BTreeMap<String, FieldSource>,
    pub merged_at: DateTime<Utc>,
    pub merged_by: String,
    #[serde(default)]
    pub unmerged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmerged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmerged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Provenance {
    /// Creates provenance for a fresh merge.
    pub fn new(
        golden_record_id: RecordId,
        source_record_ids: Vec<RecordId>,
        merged_at: DateTime<Utc>,
        merged_by: impl Into<String>,
    ) -> Self {
        Self {
            golden_record_id,
            source_record_ids,
            field_sources: BTreeMap::new(),
            merged_at,
            merged_by: merged_by.into(),
            unmerged: false,
            unmerged_at: None,
            unmerged_by: None,
            reason: None,
        }
    }

    /// Flags the merge as reversed.
    ///
    /// Returns false and leaves the audit fields untouched when the
    /// provenance was already unmerged.
    pub fn mark_unmerged(&mut self, info: &UnmergeInfo) -> bool {
        if self.unmerged {
            return false;
        }
        self.unmerged = true;
        self.unmerged_at = Some(info.unmerged_at);
        self.unmerged_by = Some(info.unmerged_by.clone());
        self.reason = info.reason.clone();
        true
    }

    /// True when `id` is one of this merge's sources.
    #[must_use]
    pub fn contains_source(&self, id: &RecordId) -> bool {
        self.source_record_ids.contains(id)
    }
}
