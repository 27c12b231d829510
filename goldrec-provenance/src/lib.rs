//! Provenance, archive and reversible unmerge for golden records.
//!
//! # Components
//!
//! - **ProvenanceStore**: persists which sources built each golden record
//! - **SourceRecordArchive**: keeps pre-merge snapshots until a merge is reversed
//! - **RecordPersistence**: optional callbacks into the caller's record storage
//! - **UnmergeExecutor**: rebuilds source records from archive + provenance
//!
//! In-memory implementations of the store and archive are provided for
//! tests and embedded use. Neither carries its own locking across calls;
//! callers serialize concurrent unmerges of the same golden record.

pub mod archive;
mod error;
pub mod persistence;
pub mod store;
pub mod unmerge;

pub use archive::{InMemorySourceRecordArchive, SourceRecordArchive};
pub use error::{StoreError, StoreResult, UnmergeError, UnmergeResult};
pub use persistence::RecordPersistence;
pub use store::{InMemoryProvenanceStore, ProvenanceStore};
pub use unmerge::{
    UnmergeCheck, UnmergeExecutor, UnmergeMode, UnmergeOptions, UnmergeOutcome, UnmergeRequest,
};
