//! Error types for provenance, archive and unmerge operations.

use chrono::{DateTime, Utc};
use goldrec_types::RecordId;
use thiserror::Error;

/// Result type for collaborator (store, archive, persistence) operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by provenance stores, archives and persistence callbacks.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (connection, I/O, driver).
    #[error("backend error: {0}")]
    Backend(String),

    /// The addressed entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write conflicts with the stored state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORE_BACKEND_ERROR",
            Self::NotFound(_) => "STORE_NOT_FOUND",
            Self::Conflict(_) => "STORE_CONFLICT",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type for unmerge operations.
pub type UnmergeResult<T> = Result<T, UnmergeError>;

/// Errors that abort an unmerge.
///
/// Precondition failures are raised before the archive or provenance is
/// touched. A callback failure leaves archive and provenance unchanged.
#[derive(Debug, Error)]
pub enum UnmergeError {
    /// No provenance exists for the golden record.
    #[error("provenance not found for golden record '{golden_record_id}'")]
    ProvenanceNotFound { golden_record_id: RecordId },

    /// The golden record was already unmerged; unmerge is one-shot.
    #[error("golden record '{golden_record_id}' was already unmerged")]
    AlreadyUnmerged {
        golden_record_id: RecordId,
        unmerged_at: Option<DateTime<Utc>>,
        unmerged_by: Option<String>,
    },

    /// Some target source records are missing from the archive.
    #[error("source records not found in archive for '{golden_record_id}': {missing:?}")]
    SourceRecordsNotFound {
        golden_record_id: RecordId,
        missing: Vec<RecordId>,
    },

    /// The request or options are unusable.
    #[error("invalid unmerge request: {reason}")]
    InvalidRequest { reason: String },

    /// A persistence callback failed.
    #[error("{operation} callback failed: {source}")]
    Callback {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Provenance store or archive failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl UnmergeError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ProvenanceNotFound { .. } => "PROVENANCE_NOT_FOUND",
            Self::AlreadyUnmerged { .. } => "ALREADY_UNMERGED",
            Self::SourceRecordsNotFound { .. } => "SOURCE_RECORD_NOT_FOUND",
            Self::InvalidRequest { .. } => "INVALID_UNMERGE_REQUEST",
            Self::Callback { .. } => "CALLBACK_FAILED",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}
