//! Error types for merge validation and execution.

use serde_json::Value;
use thiserror::Error;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors that can occur while validating or executing a merge.
///
/// Every variant is raised before any output is produced; a failed merge
/// never yields a partial golden record.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Configuration could not be parsed or is structurally invalid.
    #[error("invalid merge config: {message}")]
    InvalidConfig { message: String },

    /// The same field path appears twice in `fieldStrategies`.
    #[error("duplicate field strategy for '{field}'")]
    DuplicateFieldStrategy { field: String },

    /// A strategy option has an unusable value.
    #[error("invalid option '{option}' for field '{field}': {reason}")]
    InvalidOption {
        field: String,
        option: &'static str,
        reason: String,
    },

    /// `custom` strategy without a `customMerge` name.
    #[error("field '{field}' uses the custom strategy but names no custom merge")]
    MissingCustomMerge { field: String },

    /// `customMerge` names a strategy that is not registered.
    #[error("field '{field}' references unregistered custom merge '{name}' (registered: {registered:?})")]
    UnknownCustomMerge {
        field: String,
        name: String,
        registered: Vec<String>,
    },

    /// `customMerge` given for a non-custom strategy.
    #[error("field '{field}' names custom merge '{name}' but uses strategy '{strategy}'")]
    UnexpectedCustomMerge {
        field: String,
        name: String,
        strategy: String,
    },

    /// Fewer than two source records.
    #[error("insufficient source records: got {count}, need at least {required}")]
    InsufficientSourceRecords { count: usize, required: usize },

    /// A source record failed input validation.
    #[error("invalid source record at index {index} ('{id}'): {reason}")]
    InvalidSourceRecord {
        index: usize,
        id: String,
        reason: String,
    },

    /// Two source records share an id.
    #[error("duplicate source record id '{id}'")]
    DuplicateSourceRecordId { id: String },

    /// A configured field's root segment is not declared by the schema.
    #[error("field '{field}' is not in the schema (root '{root}', available: {available:?})")]
    UnknownSchemaField {
        field: String,
        root: String,
        available: Vec<String>,
    },

    /// A numeric-only strategy is applied to a non-numeric field.
    #[error("strategy '{strategy}' on field '{field}' expects {expected} but the field is {actual}")]
    StrategyTypeMismatch {
        strategy: String,
        field: String,
        expected: &'static str,
        actual: String,
    },

    /// Sources disagree on a field that has no explicit strategy while
    /// conflict resolution is set to `error`.
    #[error("unresolved conflict on field '{field}'")]
    UnresolvedConflict { field: String, values: Vec<Value> },

    /// Payload could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MergeError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "INVALID_MERGE_CONFIG",
            Self::DuplicateFieldStrategy { .. } => "DUPLICATE_FIELD_STRATEGY",
            Self::InvalidOption { .. } => "INVALID_STRATEGY_OPTION",
            Self::MissingCustomMerge { .. } => "MISSING_CUSTOM_MERGE",
            Self::UnknownCustomMerge { .. } => "UNKNOWN_CUSTOM_MERGE",
            Self::UnexpectedCustomMerge { .. } => "UNEXPECTED_CUSTOM_MERGE",
            Self::InsufficientSourceRecords { .. } => "INSUFFICIENT_SOURCE_RECORDS",
            Self::InvalidSourceRecord { .. } => "INVALID_SOURCE_RECORD",
            Self::DuplicateSourceRecordId { .. } => "DUPLICATE_SOURCE_RECORD_ID",
            Self::UnknownSchemaField { .. } => "UNKNOWN_SCHEMA_FIELD",
            Self::StrategyTypeMismatch { .. } => "STRATEGY_TYPE_MISMATCH",
            Self::UnresolvedConflict { .. } => "MERGE_CONFLICT",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for errors caused by configuration rather than input records.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::DuplicateFieldStrategy { .. }
                | Self::InvalidOption { .. }
                | Self::MissingCustomMerge { .. }
                | Self::UnknownCustomMerge { .. }
                | Self::UnexpectedCustomMerge { .. }
                | Self::UnknownSchemaField { .. }
                | Self::StrategyTypeMismatch { .. }
        )
    }
}
