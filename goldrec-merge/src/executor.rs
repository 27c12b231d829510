//! Field-by-field merge of validated source records into a golden record.

use chrono::{DateTime, Utc};
use goldrec_model::{
    ConflictResolution, ConflictState, ConflictValue, FieldMergeConfig, FieldSource, MergeConfig,
    MergeConflict, MergeStrategy, Provenance, StrategyOptions, StrategyRegistry,
};
use goldrec_types::path::{get_path, is_within, leaf_paths, set_path};
use goldrec_types::{Clock, RecordId, SourceRecord, SystemClock, parse_timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{MergeError, MergeResult};
use crate::resolve::{self, Present, ResolveContext};
use crate::validator;

/// Input to one merge.
#[derive(Debug, Clone)]
pub struct MergeRequest<T> {
    /// Sources in caller order. `preferFirst` / `preferLast` follow this order.
    pub source_records: Vec<SourceRecord<T>>,
    /// Id the golden record will carry. Supplied by the caller, never generated.
    pub golden_record_id: RecordId,
    /// Actor recorded as `mergedBy` in provenance.
    pub merged_by: String,
}

/// Counters describing one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    pub fields_processed: usize,
    pub conflicts_resolved: usize,
    pub conflicts_deferred: usize,
    /// Number of golden fields attributed to each source.
    pub fields_from_each_source: BTreeMap<RecordId, usize>,
}

/// Output of a successful merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome<T> {
    pub golden_record: T,
    pub golden_record_id: RecordId,
    pub provenance: Provenance,
    pub conflicts: Vec<MergeConflict>,
    pub stats: MergeStats,
}

/// Resolves every field of N source records into one golden record.
///
/// The executor is pure: it does not mutate its inputs or persist anything.
pub struct MergeExecutor {
    config: MergeConfig,
    registry: Arc<StrategyRegistry>,
    clock: Arc<dyn Clock>,
    /// Payload field holding the record id; excluded from resolution and
    /// overwritten with the golden record id.
    id_field: Option<String>,
}

impl MergeExecutor {
    /// Creates an executor with no custom strategies and the system clock.
    pub fn new(config: MergeConfig) -> Self {
        Self::with_registry(config, Arc::new(StrategyRegistry::new()))
    }

    /// Creates an executor that resolves `custom` fields through `registry`.
    pub fn with_registry(config: MergeConfig, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            config,
            registry,
            clock: Arc::new(SystemClock),
            id_field: None,
        }
    }

    /// Replaces the clock used for `mergedAt`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Treats `field` as the payload id field.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Validates the request and merges its sources.
    pub fn merge<T>(&self, request: &MergeRequest<T>) -> MergeResult<MergeOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.merge_inner(request, self.id_field.as_deref())
    }

    /// Like [`MergeExecutor::merge`], with `id_field` as the payload id field
    /// for this call. Overrides the executor's own id field.
    pub fn merge_with_id_field<T>(
        &self,
        request: &MergeRequest<T>,
        id_field: &str,
    ) -> MergeResult<MergeOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.merge_inner(request, Some(id_field))
    }

    fn merge_inner<T>(
        &self,
        request: &MergeRequest<T>,
        id_field: Option<&str>,
    ) -> MergeResult<MergeOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        validator::validate_merge_config(&self.config, &self.registry)?;
        let sources = &request.source_records;
        let payloads = validator::source_payloads(sources)?;
        let source_ids: Vec<RecordId> = sources.iter().map(|s| s.id.clone()).collect();

        debug!(
            golden_record_id = %request.golden_record_id,
            sources = sources.len(),
            "merging source records"
        );

        let mut golden = Value::Object(Map::new());
        let mut conflicts = Vec::new();
        let mut stats = MergeStats::default();
        let mut provenance = Provenance::new(
            request.golden_record_id.clone(),
            source_ids.clone(),
            self.clock.now(),
            request.merged_by.clone(),
        );

        for field in self.field_order(&payloads, id_field) {
            let present: Vec<Present<'_>> = payloads
                .iter()
                .enumerate()
                .filter_map(|(i, p)| get_path(p, &field).map(|v| (i, v)))
                .collect();
            let Some(&(first_index, first_value)) = present.first() else {
                continue;
            };

            let field_config = self.config.field_config(&field);
            let strategy = field_config.map_or(self.config.default_strategy, |f| f.strategy);
            let agree = present.iter().all(|(_, v)| *v == first_value);

            let (value, source_index) = if agree {
                (first_value.clone(), first_index)
            } else {
                if self.config.conflict_resolution == ConflictResolution::Error
                    && field_config.is_none()
                {
                    return Err(MergeError::UnresolvedConflict {
                        field,
                        values: present.iter().map(|(_, v)| (*v).clone()).collect(),
                    });
                }
                let resolution = self.resolve_field(
                    &field,
                    strategy,
                    field_config,
                    sources,
                    &payloads,
                    &present,
                );
                let source_index = resolution
                    .source
                    .or_else(|| {
                        present
                            .iter()
                            .find(|(_, v)| **v == resolution.value)
                            .map(|(i, _)| *i)
                    })
                    .unwrap_or(first_index);

                let state = match self.config.conflict_resolution {
                    ConflictResolution::MarkConflict => ConflictState::Deferred,
                    _ => ConflictState::Resolved,
                };
                match state {
                    ConflictState::Resolved => stats.conflicts_resolved += 1,
                    ConflictState::Deferred => stats.conflicts_deferred += 1,
                }
                conflicts.push(MergeConflict {
                    field: field.clone(),
                    source_values: present
                        .iter()
                        .map(|(i, v)| ConflictValue {
                            source_record_id: source_ids[*i].clone(),
                            value: (*v).clone(),
                        })
                        .collect(),
                    resolution: state,
                    strategy,
                    chosen_value: Some(resolution.value.clone()),
                });
                (resolution.value, source_index)
            };

            set_path(&mut golden, &field, value);
            stats.fields_processed += 1;
            *stats
                .fields_from_each_source
                .entry(source_ids[source_index].clone())
                .or_default() += 1;

            if self.config.track_provenance {
                provenance.field_sources.insert(
                    field,
                    FieldSource {
                        source_record_id: source_ids[source_index].clone(),
                        strategy,
                        had_conflict: !agree,
                    },
                );
            }
        }

        if let Some(id_field) = id_field {
            set_path(
                &mut golden,
                id_field,
                Value::String(request.golden_record_id.to_string()),
            );
        }

        info!(
            golden_record_id = %request.golden_record_id,
            fields = stats.fields_processed,
            conflicts = conflicts.len(),
            "merge complete"
        );

        Ok(MergeOutcome {
            golden_record: serde_json::from_value(golden)?,
            golden_record_id: request.golden_record_id.clone(),
            provenance,
            conflicts,
            stats,
        })
    }

    fn resolve_field<T>(
        &self,
        field: &str,
        strategy: MergeStrategy,
        field_config: Option<&FieldMergeConfig>,
        sources: &[SourceRecord<T>],
        payloads: &[Value],
        present: &[Present<'_>],
    ) -> resolve::Resolution {
        let default_options = StrategyOptions::default();
        let options = field_config
            .and_then(|f| f.options.as_ref())
            .unwrap_or(&default_options);
        let timestamps = if strategy.is_temporal() {
            let path = options
                .date_field
                .as_deref()
                .or(self.config.timestamp_field.as_deref());
            comparison_timestamps(sources, payloads, path)
        } else {
            Vec::new()
        };
        let custom = field_config
            .and_then(|f| f.custom_merge.as_deref())
            .and_then(|name| self.registry.get(name))
            .map(|c| &**c);

        let ctx = ResolveContext {
            field,
            options,
            timestamps: &timestamps,
            custom,
        };
        resolve::resolve(strategy, &ctx, present)
    }

    /// Configured fields in configuration order, then every other leaf path
    /// of the sources in first-seen order.
    fn field_order(&self, payloads: &[Value], id_field: Option<&str>) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        let claims = |fields: &[String], path: &str| {
            fields
                .iter()
                .any(|f| is_within(path, f) || is_within(f, path))
        };
        for configured in &self.config.field_strategies {
            if !fields.contains(&configured.field) {
                fields.push(configured.field.clone());
            }
        }
        for payload in payloads {
            for path in leaf_paths(payload) {
                let is_id =
                    id_field.is_some_and(|id| is_within(&path, id) || is_within(id, &path));
                if !is_id && !claims(&fields, &path) {
                    fields.push(path);
                }
            }
        }
        fields
    }
}

/// Timestamp compared for each source by `preferNewer` / `preferOlder`.
///
/// Reads `path` from the payload when present and parseable. The names
/// `createdAt` / `created_at` fall back to record metadata; everything else
/// falls back to `updatedAt`.
fn comparison_timestamps<T>(
    sources: &[SourceRecord<T>],
    payloads: &[Value],
    path: Option<&str>,
) -> Vec<DateTime<Utc>> {
    sources
        .iter()
        .zip(payloads)
        .map(|(source, payload)| {
            path.and_then(|p| get_path(payload, p))
                .and_then(parse_timestamp)
                .unwrap_or(match path {
                    Some("createdAt" | "created_at") => source.created_at,
                    _ => source.updated_at,
                })
        })
        .collect()
}
