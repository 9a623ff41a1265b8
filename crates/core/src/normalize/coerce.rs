//! Loose coercions from untrusted JSON values into display strings, lists and integers.

use serde_json::{Map, Value};

/// Falsy in the loose sense generators tend to rely on: null, `false`, `0`,
/// empty strings, and empty containers.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First truthy value among `keys` in `obj`.
pub fn first_truthy<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| is_truthy(v))
}

/// Render a value as display text. Strings are returned verbatim, containers as compact JSON.
pub fn display_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}

/// Truthy value among `keys`, rendered as display text.
pub fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_truthy(obj, keys).and_then(display_string)
}

/// Keep at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Coerce a JSON scalar to an integer. Floats truncate, numeric strings parse.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Length cap for the serialized fallback of a structured entry with no usable fields.
const STRUCTURED_FALLBACK_CHARS: usize = 60;

/// Coerce an I/O-style field into an ordered list of display strings.
///
/// Structured entries `{name, type, description}` become a space-joined
/// string; when every sub-field is empty the entry is serialized instead.
pub fn to_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(list_entry).collect(),
        Some(other) => display_string(other).into_iter().collect(),
    }
}

fn list_entry(item: &Value) -> Option<String> {
    match item {
        Value::Object(obj) => {
            let parts: Vec<String> = [
                text_field(obj, &["name", "var", "field"]),
                text_field(obj, &["type"]),
                text_field(obj, &["description", "desc"]),
            ]
            .into_iter()
            .flatten()
            .collect();
            if parts.is_empty() {
                let serialized = serde_json::to_string(item).ok()?;
                Some(truncate_chars(&serialized, STRUCTURED_FALLBACK_CHARS))
            } else {
                Some(parts.join(" "))
            }
        }
        other => display_string(other),
    }
}

/// Stringify every entry of a list; anything that is not a list yields nothing.
pub fn stringify_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(display_string).collect(),
        _ => Vec::new(),
    }
}
