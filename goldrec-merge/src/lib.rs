//! Merge engine for golden records.
//!
//! Turns two or more validated [`goldrec_types::SourceRecord`]s into a
//! golden record, the list of fields the sources disagreed on, and the
//! provenance needed to reverse the merge later.
//!
//! # Flow
//!
//! 1. [`validate_merge_request`] checks configuration, records and (when
//!    given) a schema.
//! 2. [`MergeExecutor::merge`] resolves fields in a fixed order: configured
//!    paths first, then every other leaf path of the sources.
//! 3. The caller persists the [`MergeOutcome`]; the executor never does.

mod error;
mod executor;
mod resolve;
pub mod validator;

pub use error::{MergeError, MergeResult};
pub use executor::{MergeExecutor, MergeOutcome, MergeRequest, MergeStats};
pub use resolve::is_empty_value;
pub use validator::{
    merge_config_from_value, parse_merge_config, validate_field_paths_against_schema,
    validate_merge_config, validate_merge_request, validate_source_records,
    validate_strategy_field_type_compatibility,
};
