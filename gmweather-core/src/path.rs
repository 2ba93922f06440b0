//! Dotted-path lookups into raw JSON payloads.
//!
//! Every segment must name a key of a JSON object; a missing key or a
//! non-object value anywhere along the way yields `None` instead of an error.

use serde_json::Value;

/// Resolve `path` (e.g. `"wind.gust.value"`) inside `root`.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))
}

/// Resolve `path` as a number. Null or non-numeric leaves yield `None`.
pub fn get_f64(root: &Value, path: &str) -> Option<f64> {
    get_path(root, path)?.as_f64()
}

pub fn get_str<'a>(root: &'a Value, path: &str) -> Option<&'a str> {
    get_path(root, path)?.as_str()
}

pub fn get_bool(root: &Value, path: &str) -> Option<bool> {
    get_path(root, path)?.as_bool()
}

/// First numeric value among `paths`, in order.
pub fn first_f64(root: &Value, paths: &[&str]) -> Option<f64> {
    paths.iter().find_map(|path| get_f64(root, path))
}

/// Array at `path`, or an empty slice when absent or not an array.
pub fn get_array<'a>(root: &'a Value, path: &str) -> &'a [Value] {
    get_path(root, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
