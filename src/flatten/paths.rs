//! Dotted-path discovery and lookup inside nested records

use super::literal::expand_value;
use crate::types::{JsonObject, JsonValue};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Separator between nested key names in a column path
pub const PATH_SEPARATOR: char = '.';

/// Collect every dotted path reachable in a record
///
/// Each key yields its own path (the parent mapping column) and, when its
/// value is a mapping, the paths of its children. Lists are never entered.
/// With `expand` set, strings that encode a mapping are entered as well.
pub fn flatten_paths(record: &JsonObject, expand: bool) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    extend_paths(record, expand, &mut paths);
    paths
}

/// Add the dotted paths of a record to an existing set
pub fn extend_paths(record: &JsonObject, expand: bool, paths: &mut BTreeSet<String>) {
    visit(record, "", expand, paths);
}

fn visit(map: &JsonObject, parent: &str, expand: bool, paths: &mut BTreeSet<String>) {
    for (key, value) in map {
        let full = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{PATH_SEPARATOR}{key}")
        };

        let value = if expand {
            expand_value(value)
        } else {
            Cow::Borrowed(value)
        };

        if let JsonValue::Object(child) = value.as_ref() {
            visit(child, &full, expand, paths);
        }
        paths.insert(full);
    }
}

/// Look up the value at a dotted path
///
/// Returns `None` when any component is missing or null, or when the walk
/// reaches a non-mapping before the path is exhausted. Mapping strings are
/// not walked through; callers expand the final value themselves.
pub fn resolve_path<'a>(record: &'a JsonObject, path: &str) -> Option<&'a JsonValue> {
    let mut parts = path.split(PATH_SEPARATOR);
    let mut current = record.get(parts.next()?)?;

    for part in parts {
        current = match current {
            JsonValue::Object(map) => map.get(part)?,
            _ => return None,
        };
    }

    (!current.is_null()).then_some(current)
}
