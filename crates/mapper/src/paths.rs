//! Dotted-path helpers for nested maps.
//!
//! `{"company": {"name": "Nike"}}` flattens to `{"company.name": "Nike"}`
//! and back. Only maps nest; lists and records are leaves.

use crate::error::{MapperError, MapperResult};
use crate::value::{MapRef, Value};

/// Path separator.
pub const SEPARATOR: char = '.';

/// Flattens nested maps into a single map with dotted keys.
///
/// Empty nested maps are kept as leaves. A map that contains itself is
/// emitted as a leaf where it recurs.
pub fn flatten(map: &MapRef) -> MapRef {
    let out = MapRef::new();
    let mut path = Vec::new();
    flatten_into(map, "", &out, &mut path);
    out
}

fn flatten_into(map: &MapRef, prefix: &str, out: &MapRef, path: &mut Vec<MapRef>) {
    path.push(map.clone());
    for (key, value) in map.entries() {
        let full = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}{SEPARATOR}{key}")
        };
        match value {
            Value::Map(nested) if !nested.is_empty() && !path.iter().any(|m| m.ptr_eq(&nested)) => {
                flatten_into(&nested, &full, out, path);
            }
            other => {
                out.insert(full, other);
            }
        }
    }
    path.pop();
}

/// Expands dotted keys into nested maps.
///
/// Fails with [`MapperError::PathConflict`] when a path is used both as a
/// leaf and as a branch, e.g. `"a" => 1` together with `"a.b" => 2`.
pub fn unflatten(map: &MapRef) -> MapperResult<MapRef> {
    let out = MapRef::new();
    for (key, value) in map.entries() {
        insert_path(&out, &key, value, true)?;
    }
    Ok(out)
}

/// Value at a dotted path, descending through nested maps.
pub fn nested_value(map: &MapRef, path: &str) -> Option<Value> {
    let mut segments = path.split(SEPARATOR);
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

/// Stores `value` at a dotted path, creating intermediate maps.
///
/// An existing non-map value on the way is a [`MapperError::PathConflict`].
pub fn set_nested(map: &MapRef, path: &str, value: impl Into<Value>) -> MapperResult<()> {
    insert_path(map, path, value.into(), false)
}

fn insert_path(root: &MapRef, path: &str, value: Value, strict: bool) -> MapperResult<()> {
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    let (leaf, branches) = segments
        .split_last()
        .ok_or_else(|| MapperError::PathConflict { path: path.to_owned() })?;

    let mut current = root.clone();
    let mut walked = String::new();
    for segment in branches {
        if !walked.is_empty() {
            walked.push(SEPARATOR);
        }
        walked.push_str(segment);
        current = match current.get(segment) {
            Some(Value::Map(next)) => next,
            None => {
                let next = MapRef::new();
                current.insert(*segment, Value::Map(next.clone()));
                next
            }
            Some(_) => return Err(MapperError::PathConflict { path: walked }),
        };
    }

    if strict && matches!(current.get(leaf), Some(Value::Map(_))) {
        return Err(MapperError::PathConflict { path: path.to_owned() });
    }
    current.insert(*leaf, value);
    Ok(())
}
