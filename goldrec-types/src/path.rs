//! Dot-path addressing over JSON trees.
//!
//! Paths look like `address.city` or `phones.0`. Lookups are total: a path
//! that walks off the tree yields `None`, never an error.

use serde_json::{Map, Value};

/// Returns the text before the first `.` of a path.
#[must_use]
pub fn root_segment(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Resolves `path` inside `value`.
///
/// Object keys are matched exactly. A numeric segment indexes into arrays.
/// An empty path resolves to `value` itself.
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Writes `new_value` at `path`, creating intermediate objects.
///
/// A numeric segment addresses an existing array element. Any other node
/// that is not an object is replaced by one.
pub fn set_path(target: &mut Value, path: &str, new_value: Value) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    if let Value::Array(items) = target
        && let Some(slot) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i))
    {
        match rest {
            Some(rest) => set_path(slot, rest, new_value),
            None => *slot = new_value,
        }
        return;
    }
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };
    match rest {
        None => {
            map.insert(head.to_string(), new_value);
        }
        Some(rest) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_path(child, rest, new_value);
        }
    }
}

/// Lists every leaf path of `value` in key order.
///
/// Non-empty objects are descended into. Arrays, scalars and empty objects
/// are leaves.
#[must_use]
pub fn leaf_paths(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    if let Value::Object(map) = value {
        collect_leaves(map, "", &mut out);
    }
    out
}

fn collect_leaves(map: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match child {
            Value::Object(inner) if !inner.is_empty() => collect_leaves(inner, &path, out),
            _ => out.push(path),
        }
    }
}

/// Returns true when `path` equals `ancestor` or lies underneath it.
#[must_use]
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'.')
}
