//! Per-type property controls
//!
//! Each control renders from `(property, stored value)` and turns an
//! interaction into effects. Object-valued controls expose their pruning
//! rules as plain transition functions over the whole stored object.

pub mod class;
pub mod gallery;
pub mod icon;
pub mod image;
pub mod link;
pub mod query;
pub mod rich_text;
pub mod select;
pub mod text;
pub mod toggle;

use crate::error::{ControlError, ControlResult};
use blocks_schema::is_removable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Stored object, or an empty one when absent or `false`
///
/// Any other shape is reported so the control can render an inline error.
pub(crate) fn object_or_empty(
    value: Option<&Value>,
    property_id: &str,
    expected: &'static str,
) -> ControlResult<Map<String, Value>> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(Map::new()),
        Some(Value::String(text)) if text.is_empty() => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ControlError::InvalidValue {
            property_id: property_id.to_string(),
            expected,
        }),
    }
}

/// Text of a string field, empty when missing
pub(crate) fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Set `key`, or drop it when the value is empty or `false`
pub(crate) fn set_or_remove(map: &mut Map<String, Value>, key: &str, value: Value) {
    if is_removable(&value) || value == Value::Bool(false) {
        map.remove(key);
    } else {
        map.insert(key.to_string(), value);
    }
}

pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().map_or(true, |n| n != 0.0),
        Some(_) => true,
    }
}

/// Asset handed back by the host media picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Size variants keyed by size name
    #[serde(default)]
    pub sizes: BTreeMap<String, MediaSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSize {
    pub url: String,
}

impl MediaAsset {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            filename: None,
            title: None,
            sizes: BTreeMap::new(),
        }
    }

    pub fn with_size(mut self, size: &str, url: impl Into<String>) -> Self {
        self.sizes.insert(size.to_string(), MediaSize { url: url.into() });
        self
    }

    /// Filename, else title, else empty
    pub fn display_filename(&self) -> String {
        self.filename
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| self.title.clone())
            .unwrap_or_default()
    }

    /// URL of a size variant, falling back to the original
    pub fn url_for_size(&self, size: &str) -> &str {
        self.sizes.get(size).map(|variant| variant.url.as_str()).unwrap_or(&self.url)
    }
}

/// Registered image sizes offered by image and gallery controls
pub(crate) const IMAGE_SIZES: [(&str, &str); 4] = [
    ("thumbnail", "thumbnail150"),
    ("medium", "medium300"),
    ("large", "large1024"),
    ("full", "fullSize"),
];

pub(crate) const DEFAULT_IMAGE_SIZE: &str = "full";
