//! Pre-flight validation of merge configuration and input records.
//!
//! Everything here runs before the executor touches a field, so a request
//! that passes validation can only fail during execution on a genuine
//! `error`-mode conflict.

use goldrec_model::{FieldMergeConfig, MergeConfig, MergeStrategy, RecordSchema, StrategyRegistry};
use goldrec_types::SourceRecord;
use goldrec_types::path::root_segment;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{MergeError, MergeResult};

/// Minimum number of source records a merge accepts.
pub const MIN_SOURCE_RECORDS: usize = 2;

/// Parses configuration text, reporting parse failures as config errors.
///
/// Unknown strategy tags, unknown conflict modes and wrongly typed options
/// are all rejected here.
pub fn parse_merge_config(json: &str) -> MergeResult<MergeConfig> {
    let value: Value = serde_json::from_str(json).map_err(|e| MergeError::InvalidConfig {
        message: e.to_string(),
    })?;
    merge_config_from_value(value)
}

/// Converts a decoded JSON value into configuration.
pub fn merge_config_from_value(value: Value) -> MergeResult<MergeConfig> {
    if let Some(strategies) = value.get("fieldStrategies")
        && !strategies.is_array()
    {
        return Err(MergeError::InvalidConfig {
            message: "fieldStrategies must be an array".into(),
        });
    }
    MergeConfig::from_value(value).map_err(|e| MergeError::InvalidConfig {
        message: e.to_string(),
    })
}

/// Validates a parsed configuration against the custom strategy registry.
pub fn validate_merge_config(config: &MergeConfig, registry: &StrategyRegistry) -> MergeResult<()> {
    if config.default_strategy == MergeStrategy::Custom {
        return Err(MergeError::InvalidConfig {
            message: "defaultStrategy cannot be 'custom'; configure custom merges per field"
                .into(),
        });
    }

    let mut seen = HashSet::new();
    for field in &config.field_strategies {
        validate_field_path(&field.field)?;
        if !seen.insert(field.field.as_str()) {
            return Err(MergeError::DuplicateFieldStrategy {
                field: field.field.clone(),
            });
        }
        validate_custom(field, registry)?;
        validate_options(field)?;
    }

    if let Some(ts) = &config.timestamp_field {
        if ts.trim().is_empty() {
            return Err(MergeError::InvalidConfig {
                message: "timestampField must not be empty".into(),
            });
        }
    }
    Ok(())
}

fn validate_field_path(path: &str) -> MergeResult<()> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(MergeError::InvalidConfig {
            message: format!("invalid field path '{path}'"),
        });
    }
    if path.split('.').any(|segment| segment.parse::<usize>().is_ok()) {
        return Err(MergeError::InvalidConfig {
            message: format!(
                "field path '{path}' addresses an array element; configure the array field"
            ),
        });
    }
    Ok(())
}

fn validate_custom(field: &FieldMergeConfig, registry: &StrategyRegistry) -> MergeResult<()> {
    match (field.strategy, &field.custom_merge) {
        (MergeStrategy::Custom, None) => Err(MergeError::MissingCustomMerge {
            field: field.field.clone(),
        }),
        (MergeStrategy::Custom, Some(name)) if !registry.contains(name) => {
            Err(MergeError::UnknownCustomMerge {
                field: field.field.clone(),
                name: name.clone(),
                registered: registry.names().map(str::to_string).collect(),
            })
        }
        (strategy, Some(name)) if strategy != MergeStrategy::Custom => {
            Err(MergeError::UnexpectedCustomMerge {
                field: field.field.clone(),
                name: name.clone(),
                strategy: strategy.to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn validate_options(field: &FieldMergeConfig) -> MergeResult<()> {
    let Some(options) = &field.options else {
        return Ok(());
    };
    if let Some(date_field) = &options.date_field {
        if date_field.trim().is_empty() {
            return Err(MergeError::InvalidOption {
                field: field.field.clone(),
                option: "dateField",
                reason: "must be a non-empty path".into(),
            });
        }
    }
    Ok(())
}

/// Validates the source records of a merge.
pub fn validate_source_records<T: Serialize>(records: &[SourceRecord<T>]) -> MergeResult<()> {
    source_payloads(records).map(|_| ())
}

/// Validates source records and returns their payloads as JSON objects.
pub(crate) fn source_payloads<T: Serialize>(
    records: &[SourceRecord<T>],
) -> MergeResult<Vec<Value>> {
    if records.len() < MIN_SOURCE_RECORDS {
        return Err(MergeError::InsufficientSourceRecords {
            count: records.len(),
            required: MIN_SOURCE_RECORDS,
        });
    }

    let mut seen = HashSet::new();
    let mut payloads = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if record.id.is_blank() {
            return Err(MergeError::InvalidSourceRecord {
                index,
                id: record.id.to_string(),
                reason: "id must be a non-empty string".into(),
            });
        }
        if !seen.insert(&record.id) {
            return Err(MergeError::DuplicateSourceRecordId {
                id: record.id.to_string(),
            });
        }
        let payload = serde_json::to_value(&record.record)?;
        if !payload.is_object() {
            return Err(MergeError::InvalidSourceRecord {
                index,
                id: record.id.to_string(),
                reason: format!("payload must be an object, got {}", json_kind(&payload)),
            });
        }
        payloads.push(payload);
    }
    Ok(payloads)
}

/// Checks that the root segment of every configured field exists in `schema`.
pub fn validate_field_paths_against_schema(
    config: &MergeConfig,
    schema: &RecordSchema,
) -> MergeResult<()> {
    for field in &config.field_strategies {
        let root = root_segment(&field.field);
        if !schema.contains(root) {
            return Err(MergeError::UnknownSchemaField {
                field: field.field.clone(),
                root: root.to_string(),
                available: schema.field_names().map(str::to_string).collect(),
            });
        }
    }
    Ok(())
}

/// Rejects numeric-only strategies on fields the schema declares non-numeric.
///
/// Explicit field strategies are checked against their own schema entry.
/// A numeric default strategy is checked against every schema field that
/// has no explicit strategy.
pub fn validate_strategy_field_type_compatibility(
    config: &MergeConfig,
    schema: &RecordSchema,
) -> MergeResult<()> {
    for field in &config.field_strategies {
        if let Some(declared) = schema.field(&field.field) {
            check_numeric(field.strategy, &field.field, declared.field_type)?;
        }
    }
    if config.default_strategy.is_numeric() {
        for declared in &schema.fields {
            if config.field_config(&declared.name).is_none() {
                check_numeric(config.default_strategy, &declared.name, declared.field_type)?;
            }
        }
    }
    Ok(())
}

fn check_numeric(
    strategy: MergeStrategy,
    field: &str,
    actual: goldrec_model::FieldType,
) -> MergeResult<()> {
    if strategy.is_numeric() && !actual.is_numeric() {
        return Err(MergeError::StrategyTypeMismatch {
            strategy: strategy.to_string(),
            field: field.to_string(),
            expected: "number",
            actual: actual.as_str().to_string(),
        });
    }
    Ok(())
}

/// Runs every check for one merge request.
///
/// Schema-aware checks only run when a schema is supplied.
pub fn validate_merge_request<T: Serialize>(
    config: &MergeConfig,
    registry: &StrategyRegistry,
    records: &[SourceRecord<T>],
    schema: Option<&RecordSchema>,
) -> MergeResult<()> {
    validate_merge_config(config, registry)?;
    validate_source_records(records)?;
    if let Some(schema) = schema {
        validate_field_paths_against_schema(config, schema)?;
        validate_strategy_field_type_compatibility(config, schema)?;
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
