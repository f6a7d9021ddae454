//! # Value Coercion
//!
//! `coerce` maps whatever a control produced to the stored shape for the
//! declared property type. It is total and idempotent: every input yields a
//! value and coercing an already coerced value changes nothing.
//!
//! | raw      | array-shaped kind | object-shaped kind | text-like kind     | other kind        |
//! |----------|-------------------|--------------------|--------------------|-------------------|
//! | array    | unchanged         | first element      | joined with ", "   | first element     |
//! | object   | `""`              | unchanged          | url / name / label | `""`              |
//! | scalar   | unchanged         | unchanged          | unchanged          | unchanged         |
//!
//! The image gallery is both array- and object-shaped. A declared but
//! unrecognized type tag falls in the last column even though it is edited
//! with the text control.

use crate::kind::PropertyKind;
use serde_json::{Map, Value};

const JOIN_SEPARATOR: &str = ", ";

/// Keys tried, in order, when summarizing an object as text
const TEXT_KEYS: [&str; 3] = ["url", "name", "label"];

/// Canonical value for `raw` under `kind`
pub fn coerce(raw: &Value, kind: &PropertyKind) -> Value {
    match raw {
        Value::Array(items) => {
            if kind.accepts_array() {
                raw.clone()
            } else if kind.is_text_like() {
                Value::String(join_text(items))
            } else {
                // Recurse so nested arrays settle in one pass
                items
                    .first()
                    .map(|first| coerce(first, kind))
                    .unwrap_or_else(|| Value::String(String::new()))
            }
        }
        Value::Object(map) => {
            if kind.accepts_object() {
                raw.clone()
            } else if kind.is_text_like() {
                Value::String(text_from_object(map))
            } else {
                Value::String(String::new())
            }
        }
        _ => raw.clone(),
    }
}

fn join_text(items: &[Value]) -> String {
    items
        .iter()
        .map(text_fragment)
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

fn text_fragment(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => join_text(items),
        Value::Object(map) => text_from_object(map),
    }
}

/// Human readable summary of an object value
///
/// Tries `url`, then `name`, then `label`; falls back to the JSON text.
pub fn text_from_object(map: &Map<String, Value>) -> String {
    TEXT_KEYS
        .iter()
        .find_map(|key| match map.get(*key) {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            Some(Value::Bool(true)) => Some("true".to_string()),
            _ => None,
        })
        .unwrap_or_else(|| Value::Object(map.clone()).to_string())
}

/// Values the store never keeps: null, `""`, `[]` and `{}`
pub fn is_removable(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Whether a stored value means "nothing chosen" for its property type
pub fn is_empty_for(kind: &PropertyKind, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return true;
    };
    if value.is_null() {
        return true;
    }

    match kind {
        // Any stored toggle value is an explicit choice
        PropertyKind::Toggle => false,
        PropertyKind::Select | PropertyKind::Class => is_removable(value),
        PropertyKind::Icon => !has_non_empty(value, "library"),
        PropertyKind::Image => !has_non_empty(value, "url") && !has_non_empty(value, "id"),
        PropertyKind::ImageGallery => match value {
            Value::Bool(false) => true,
            Value::Array(images) => images.is_empty(),
            Value::Object(map) => {
                let dynamic = map.get("useDynamicData").map_or(false, |v| !is_removable(v));
                let images = map
                    .get("images")
                    .and_then(Value::as_array)
                    .map_or(false, |images| !images.is_empty());
                !dynamic && !images
            }
            _ => true,
        },
        PropertyKind::Link => matches!(value, Value::Bool(false)) || is_removable(value),
        PropertyKind::Query => is_removable(value),
        _ => matches!(value, Value::String(text) if text.is_empty()),
    }
}

fn has_non_empty(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .map_or(false, |field| !is_removable(field) && field != &Value::Bool(false))
}
