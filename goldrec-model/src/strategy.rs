use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field is resolved when source records disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// First source in caller order wins.
    PreferFirst,
    /// Last source in caller order wins.
    PreferLast,
    /// Source with the most recent timestamp wins.
    PreferNewer,
    /// Source with the oldest timestamp wins.
    PreferOlder,
    /// First value that is not null, blank or an empty collection.
    PreferNonNull,
    /// Longest value wins.
    PreferLonger,
    /// Shortest value wins.
    PreferShorter,
    /// Values joined into one string.
    Concatenate,
    /// Set union of array values.
    Union,
    /// Most common value wins.
    MostFrequent,
    Max,
    Min,
    Sum,
    Avg,
    /// Caller-supplied strategy looked up by name in a [`crate::StrategyRegistry`].
    Custom,
}

impl MergeStrategy {
    /// Every built-in strategy, in declaration order.
    pub const ALL: [MergeStrategy; 15] = [
        Self::PreferFirst,
        Self::PreferLast,
        Self::PreferNewer,
        Self::PreferOlder,
        Self::PreferNonNull,
        Self::PreferLonger,
        Self::PreferShorter,
        Self::Concatenate,
        Self::Union,
        Self::MostFrequent,
        Self::Max,
        Self::Min,
        Self::Sum,
        Self::Avg,
        Self::Custom,
    ];

    /// Returns the configuration tag for this strategy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreferFirst => "preferFirst",
            Self::PreferLast => "preferLast",
            Self::PreferNewer => "preferNewer",
            Self::PreferOlder => "preferOlder",
            Self::PreferNonNull => "preferNonNull",
            Self::PreferLonger => "preferLonger",
            Self::PreferShorter => "preferShorter",
            Self::Concatenate => "concatenate",
            Self::Union => "union",
            Self::MostFrequent => "mostFrequent",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Custom => "custom",
        }
    }

    /// Parses a configuration tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == tag)
    }

    /// True for strategies that only make sense on numeric fields.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Max | Self::Min | Self::Sum | Self::Avg)
    }

    /// True for strategies that compare record timestamps.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::PreferNewer | Self::PreferOlder)
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `concatenate` treats empty values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NullHandling {
    /// Empty values are left out.
    #[default]
    Skip,
    /// Empty values contribute an empty segment.
    Include,
    /// Any null value makes the whole result null.
    PreferNull,
}

/// Per-field strategy options. Unused options are ignored by strategies
/// that do not read them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_duplicates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_handling: Option<NullHandling>,
    /// Payload path compared by `preferNewer` / `preferOlder` for this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_field: Option<String>,
}

impl StrategyOptions {
    /// Separator used by `concatenate` when none is configured.
    pub const DEFAULT_SEPARATOR: &'static str = " ";

    /// Returns the configured separator or the default.
    #[must_use]
    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(Self::DEFAULT_SEPARATOR)
    }

    /// Returns whether duplicates are dropped (default false).
    #[must_use]
    pub fn remove_duplicates(&self) -> bool {
        self.remove_duplicates.unwrap_or(false)
    }

    /// Returns the null handling mode (default skip).
    #[must_use]
    pub fn null_handling(&self) -> NullHandling {
        self.null_handling.unwrap_or_default()
    }
}
