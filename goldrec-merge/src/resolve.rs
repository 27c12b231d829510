//! Built-in field resolution strategies.
//!
//! Each strategy receives the values present for one field, paired with the
//! index of the source they came from, in caller order. Ties always go to
//! the earliest source.

use chrono::{DateTime, Utc};
use goldrec_model::{CustomMerge, MergeStrategy, NullHandling, StrategyOptions};
use serde_json::{Number, Value};

/// A value present in one source.
pub(crate) type Present<'a> = (usize, &'a Value);

/// Inputs a strategy may consult besides the values themselves.
pub(crate) struct ResolveContext<'a> {
    pub field: &'a str,
    pub options: &'a StrategyOptions,
    /// Comparison timestamp per source, indexed like the sources.
    pub timestamps: &'a [DateTime<Utc>],
    pub custom: Option<&'a dyn CustomMerge>,
}

/// The chosen value and, for selecting strategies, the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub value: Value,
    pub source: Option<usize>,
}

impl Resolution {
    fn picked(present: Present<'_>) -> Self {
        Self {
            value: present.1.clone(),
            source: Some(present.0),
        }
    }

    fn computed(value: Value) -> Self {
        Self {
            value,
            source: None,
        }
    }
}

/// True for null, blank strings and empty arrays or objects.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Applies `strategy` to the present values of one field.
///
/// `present` must not be empty.
pub(crate) fn resolve(
    strategy: MergeStrategy,
    ctx: &ResolveContext<'_>,
    present: &[Present<'_>],
) -> Resolution {
    let Some(&first) = present.first() else {
        return Resolution::computed(Value::Null);
    };
    match strategy {
        MergeStrategy::PreferFirst => Resolution::picked(first),
        MergeStrategy::PreferLast => present
            .last()
            .copied()
            .map_or_else(|| Resolution::picked(first), Resolution::picked),
        MergeStrategy::PreferNewer => {
            pick_by(present, |a, b| ctx.timestamps[a.0] > ctx.timestamps[b.0])
        }
        MergeStrategy::PreferOlder => {
            pick_by(present, |a, b| ctx.timestamps[a.0] < ctx.timestamps[b.0])
        }
        MergeStrategy::PreferLonger => pick_by(present, |a, b| value_len(a.1) > value_len(b.1)),
        MergeStrategy::PreferShorter => pick_by(present, |a, b| value_len(a.1) < value_len(b.1)),
        MergeStrategy::PreferNonNull => present
            .iter()
            .find(|(_, v)| !is_empty_value(v))
            .copied()
            .map_or_else(|| Resolution::picked(first), Resolution::picked),
        MergeStrategy::MostFrequent => most_frequent(present),
        MergeStrategy::Max => numeric_pick(present, |a, b| a > b),
        MergeStrategy::Min => numeric_pick(present, |a, b| a < b),
        MergeStrategy::Sum => Resolution::computed(sum(present)),
        MergeStrategy::Avg => Resolution::computed(avg(present)),
        MergeStrategy::Concatenate => Resolution::computed(concatenate(ctx.options, present)),
        MergeStrategy::Union => Resolution::computed(union(present)),
        MergeStrategy::Custom => {
            let values: Vec<Value> = present.iter().map(|(_, v)| (*v).clone()).collect();
            let value = ctx
                .custom
                .map_or(Value::Null, |custom| custom.resolve(ctx.field, &values));
            Resolution::computed(value)
        }
    }
}

/// Keeps the first value unless a later one strictly beats it.
fn pick_by(
    present: &[Present<'_>],
    beats: impl Fn(&Present<'_>, &Present<'_>) -> bool,
) -> Resolution {
    let mut best = present[0];
    for candidate in &present[1..] {
        if beats(candidate, &best) {
            best = *candidate;
        }
    }
    Resolution::picked(best)
}

/// Length used by `preferLonger` / `preferShorter`.
fn value_len(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => other.to_string().chars().count(),
    }
}

fn most_frequent(present: &[Present<'_>]) -> Resolution {
    let mut tally: Vec<(Present<'_>, usize)> = Vec::new();
    for item in present {
        match tally.iter_mut().find(|(seen, _)| seen.1 == item.1) {
            Some((_, count)) => *count += 1,
            None => tally.push((*item, 1)),
        }
    }
    let mut best = tally[0];
    for entry in &tally[1..] {
        if entry.1 > best.1 {
            best = *entry;
        }
    }
    Resolution::picked(best.0)
}

fn numeric_pick(present: &[Present<'_>], beats: impl Fn(f64, f64) -> bool) -> Resolution {
    let mut best: Option<(Present<'_>, f64)> = None;
    for item in present {
        let Some(n) = item.1.as_f64() else { continue };
        match best {
            Some((_, current)) if !beats(n, current) => {}
            _ => best = Some((*item, n)),
        }
    }
    best.map_or(Resolution::computed(Value::Null), |(item, _)| Resolution::picked(item))
}

fn sum(present: &[Present<'_>]) -> Value {
    let numbers: Vec<&Number> = present
        .iter()
        .filter_map(|(_, v)| match v {
            Value::Number(n) => Some(n),
            _ => None,
        })
        .collect();
    if numbers.is_empty() {
        return Value::Null;
    }
    let integral: Option<i64> = numbers
        .iter()
        .try_fold(0i64, |acc, n| n.as_i64().and_then(|i| acc.checked_add(i)));
    if let Some(total) = integral {
        return Value::from(total);
    }
    float_value(numbers.iter().filter_map(|n| n.as_f64()).sum())
}

fn avg(present: &[Present<'_>]) -> Value {
    let numbers: Vec<f64> = present.iter().filter_map(|(_, v)| v.as_f64()).collect();
    if numbers.is_empty() {
        return Value::Null;
    }
    float_value(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn float_value(n: f64) -> Value {
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn concatenate(options: &StrategyOptions, present: &[Present<'_>]) -> Value {
    let null_handling = options.null_handling();
    let mut parts: Vec<String> = Vec::new();
    for (_, value) in present {
        if is_empty_value(value) {
            match null_handling {
                NullHandling::Skip => continue,
                NullHandling::Include => parts.push(String::new()),
                NullHandling::PreferNull if value.is_null() => return Value::Null,
                NullHandling::PreferNull => continue,
            }
        } else {
            parts.push(text_of(value));
        }
    }
    if options.remove_duplicates() {
        let mut unique: Vec<String> = Vec::with_capacity(parts.len());
        for part in parts {
            if !unique.contains(&part) {
                unique.push(part);
            }
        }
        parts = unique;
    }
    Value::String(parts.join(options.separator()))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn union(present: &[Present<'_>]) -> Value {
    let mut items: Vec<Value> = Vec::new();
    let mut push = |v: &Value| {
        if !v.is_null() && !items.contains(v) {
            items.push(v.clone());
        }
    };
    for (_, value) in present {
        match value {
            Value::Array(inner) => inner.iter().for_each(&mut push),
            other => push(other),
        }
    }
    Value::Array(items)
}
