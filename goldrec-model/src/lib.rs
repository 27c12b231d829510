//! Core model for golden-record merging.
//!
//! Defines the types the merge, unmerge and review crates share:
//! - [`MergeConfig`] / [`FieldMergeConfig`]: which strategy resolves each field
//! - [`MergeStrategy`]: the closed set of built-in resolution strategies
//! - [`MergeConflict`]: a field where sources disagreed
//! - [`Provenance`]: which source contributed each golden-record field
//! - [`RecordSchema`]: optional field typing used for pre-flight checks
//! - [`CustomMerge`] / [`StrategyRegistry`]: named caller-supplied strategies
//!
//! Configuration is plain serde data. Custom strategies are referenced by
//! name and resolved through a registry so configs stay serializable.

mod config;
mod conflict;
mod custom;
mod provenance;
mod schema;
mod strategy;

pub use config::{ConflictResolution, FieldMergeConfig, MergeConfig};
pub use conflict::{ConflictState, ConflictValue, MergeConflict};
pub use custom::{CustomMerge, StrategyRegistry};
pub use provenance::{FieldSource, Provenance, UnmergeInfo};
pub use schema::{FieldType, RecordSchema, SchemaField};
pub use strategy::{MergeStrategy, NullHandling, StrategyOptions};
