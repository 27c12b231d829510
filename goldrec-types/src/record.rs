//! Source record snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RecordId;

/// An immutable snapshot of a record taken before it is merged.
///
/// The payload type is opaque to this crate. The merge engine requires it
/// to serialize into a JSON object so fields can be addressed by dot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord<T = Value> {
    pub id: RecordId,
    pub record: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T> SourceRecord<T> {
    /// Creates a snapshot with explicit timestamps.
    pub fn new(
        id: impl Into<RecordId>,
        record: T,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            record,
            created_at,
            updated_at,
        }
    }

    /// Creates a snapshot whose created and updated timestamps are both `at`.
    pub fn at(id: impl Into<RecordId>, record: T, at: DateTime<Utc>) -> Self {
        Self::new(id, record, at, at)
    }
}

/// Interprets a payload value as a point in time.
///
/// Accepts RFC 3339 strings and integral Unix epoch milliseconds.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
