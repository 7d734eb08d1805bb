//! Render data: shared defaults, per-call locals and how they combine.
//!
//! Every render sees one flat map. It is built fresh for each call by copying
//! the registry's shared data and then overlaying the call's local data, so a
//! local key always shadows a shared key of the same name and nothing a
//! template receives can flow back into the registry.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, ThemeError};

/// A flat key-value scope as seen by one template.
pub type DataMap = serde_json::Map<String, Value>;

/// Converts render-local data into a flat map.
///
/// Accepts anything that serializes to a JSON object. `null` (including `()`
/// and `None`) means "no local data".
pub fn to_data_map<T: Serialize + ?Sized>(data: &T) -> Result<DataMap> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(DataMap::new()),
        other => Err(ThemeError::InvalidInput(format!(
            "render data must be a map of names to values, got {}",
            kind_name(&other)
        ))),
    }
}

/// Overlays `local` on a copy of `shared`; local keys win.
pub(crate) fn merge_scope(shared: &DataMap, local: DataMap) -> DataMap {
    let mut scope = shared.clone();
    for (key, value) in local {
        scope.insert(key, value);
    }
    scope
}

/// Whether a value counts as "missing" for [`get_data_or`](crate::ThemeRegistry::get_data_or).
///
/// Mirrors the loose emptiness test the lookup has always used: `null`,
/// `false`, numeric zero, `""`, `"0"` and empty arrays/objects are all empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
