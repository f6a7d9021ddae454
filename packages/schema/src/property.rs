use crate::kind::PropertyKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared, typed input slot on a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: PropertyKind,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Static choices: an array of `{value, label}` or a `value → label` map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    /// Descriptor for a deferred, server-fetched choice list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_ajax: Option<Map<String, Value>>,

    #[serde(default)]
    pub multiple: bool,

    #[serde(default)]
    pub searchable: bool,

    /// Element bindings; a property without any is not editable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Value>,

    /// Icon control: `"custom"` restricts the library list to custom sets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<String>,

    /// Link control: link types and fields to hide
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Link control: `false` hides the lightbox link types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<bool>,
}

impl PropertyDefinition {
    pub fn new(id: impl Into<String>, kind: PropertyKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            help: None,
            placeholder: None,
            default: None,
            options: None,
            options_ajax: None,
            multiple: false,
            searchable: false,
            connections: None,
            libraries: None,
            exclude: Vec::new(),
            popup: None,
        }
    }

    /// Bind to an element so the property is exposed in the editor
    pub fn connected(mut self, element_id: &str) -> Self {
        let mut connections = Map::new();
        connections.insert(element_id.to_string(), Value::Array(vec![Value::from("text")]));
        self.connections = Some(Value::Object(connections));
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_options_ajax(mut self, descriptor: Map<String, Value>) -> Self {
        self.options_ajax = Some(descriptor);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// A non-empty map, or a non-empty list as PHP encodes sequential keys
    pub fn has_connections(&self) -> bool {
        match &self.connections {
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(list)) => !list.is_empty(),
            _ => false,
        }
    }

    /// Has an id, a label and at least one connection
    pub fn is_editable(&self) -> bool {
        !self.id.is_empty() && !self.label.is_empty() && self.has_connections()
    }

    pub fn has_deferred_options(&self) -> bool {
        self.options_ajax.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_select_property() {
        let property: PropertyDefinition = serde_json::from_value(json!({
            "id": "tone",
            "type": "select",
            "label": "Tone",
            "options": { "warm": "Warm", "cool": "Cool" },
            "multiple": true,
            "connections": { "el1": ["settings.tone"] }
        }))
        .unwrap();

        assert_eq!(property.kind, PropertyKind::Select);
        assert!(property.multiple);
        assert!(property.is_editable());
    }

    #[test]
    fn test_missing_or_empty_connections_hide_property() {
        let bare = PropertyDefinition::new("title", PropertyKind::Text, "Title");
        assert!(!bare.is_editable());

        let mut empty = bare.clone();
        empty.connections = Some(json!({}));
        assert!(!empty.is_editable());

        let mut empty_list = bare.clone();
        empty_list.connections = Some(json!([]));
        assert!(!empty_list.is_editable());

        let mut wrong_shape = bare.clone();
        wrong_shape.connections = Some(json!("el1"));
        assert!(!wrong_shape.is_editable());

        let mut list = bare.clone();
        list.connections = Some(json!([["text"]]));
        assert!(list.is_editable());

        assert!(bare.connected("el1").is_editable());
    }

    #[test]
    fn test_missing_type_defaults_to_text() {
        let property: PropertyDefinition =
            serde_json::from_value(json!({ "id": "a", "label": "A" })).unwrap();
        assert_eq!(property.kind, PropertyKind::Text);
    }
}
