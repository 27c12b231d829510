use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{MergeStrategy, StrategyOptions};

/// What happens when sources disagree on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    /// A disagreement on a field with no explicit strategy aborts the merge.
    Error,
    /// Resolve with the field's strategy and record the conflict as resolved.
    #[default]
    UseDefault,
    /// Resolve with the field's strategy but record the conflict as deferred.
    MarkConflict,
}

impl ConflictResolution {
    pub const ALL: [ConflictResolution; 3] = [Self::Error, Self::UseDefault, Self::MarkConflict];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::UseDefault => "useDefault",
            Self::MarkConflict => "markConflict",
        }
    }
}

/// Strategy configuration for one field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMergeConfig {
    /// Dot path of the field (e.g. `address.city`).
    pub field: String,
    pub strategy: MergeStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<StrategyOptions>,
    /// Registry name of the custom strategy. Present iff `strategy` is `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_merge: Option<String>,
}

impl FieldMergeConfig {
    /// Shorthand for a built-in strategy without options.
    pub fn new(field: impl Into<String>, strategy: MergeStrategy) -> Self {
        Self {
            field: field.into(),
            strategy,
            options: None,
            custom_merge: None,
        }
    }

    /// Shorthand for a named custom strategy.
    pub fn custom(field: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            strategy: MergeStrategy::Custom,
            options: None,
            custom_merge: Some(name.into()),
        }
    }

    /// Attaches strategy options.
    #[must_use]
    pub fn with_options(mut self, options: StrategyOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Configuration for one merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConfig {
    /// Strategy for every field without an explicit entry.
    pub default_strategy: MergeStrategy,
    #[serde(default)]
    pub field_strategies: Vec<FieldMergeConfig>,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default = "default_track_provenance")]
    pub track_provenance: bool,
    /// Path compared by `preferNewer` / `preferOlder`. Falls back to `updatedAt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_field: Option<String>,
}

fn default_track_provenance() -> bool {
    true
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_strategy: MergeStrategy::PreferNonNull,
            field_strategies: Vec::new(),
            conflict_resolution: ConflictResolution::UseDefault,
            track_provenance: true,
            timestamp_field: None,
        }
    }
}

impl MergeConfig {
    /// Creates a config with the given default strategy and nothing else.
    #[must_use]
    pub fn with_default(default_strategy: MergeStrategy) -> Self {
        Self {
            default_strategy,
            ..Self::default()
        }
    }

    /// Appends an explicit field strategy.
    #[must_use]
    pub fn with_field(mut self, field: FieldMergeConfig) -> Self {
        self.field_strategies.push(field);
        self
    }

    #[must_use]
    pub fn with_conflict_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.conflict_resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_provenance(mut self, track: bool) -> Self {
        self.track_provenance = track;
        self
    }

    /// Returns the explicit configuration for `field`, if any.
    #[must_use]
    pub fn field_config(&self, field: &str) -> Option<&FieldMergeConfig> {
        self.field_strategies.iter().find(|f| f.field == field)
    }

    /// Returns the strategy that resolves `field`.
    #[must_use]
    pub fn strategy_for(&self, field: &str) -> MergeStrategy {
        self.field_config(field)
            .map_or(self.default_strategy, |f| f.strategy)
    }

    /// Parses a config from JSON text.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parses a config from an already decoded JSON value.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
