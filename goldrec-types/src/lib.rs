//! Core type definitions for the golden-record engine.
//!
//! This crate defines the small, payload-agnostic types every other crate
//! builds on:
//! - Record and queue item identifiers
//! - [`SourceRecord`], the immutable pre-merge snapshot
//! - An injectable [`Clock`] so audit timestamps are deterministic under test
//! - A total dot-path accessor over `serde_json::Value` trees
//!
//! Payload structure is opaque here. Everything that understands field
//! semantics (strategies, schemas, provenance) lives in the crates above.

mod clock;
mod ids;
pub mod path;
mod record;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{QueueItemId, RecordId, derive_record_id};
pub use record::{SourceRecord, parse_timestamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("record id must be a non-empty string")]
    EmptyId,
}
