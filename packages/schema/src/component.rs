use crate::error::SchemaError;
use crate::kind::PropertyKind;
use crate::property::PropertyDefinition;
use blocks_common::I18n;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Element of a component template; only the label matters here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStub {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Reusable template registered as one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub id: String,

    #[serde(default)]
    pub elements: Vec<ElementStub>,

    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ComponentDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            elements: vec![ElementStub::default()],
            properties: Vec::new(),
            description: None,
        }
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        match self.elements.first_mut() {
            Some(first) => first.label = Some(label.into()),
            None => self.elements.push(ElementStub {
                id: None,
                label: Some(label.into()),
            }),
        }
        self
    }

    /// Parse one raw component from the host snapshot
    ///
    /// The component itself must have an id and at least one element.
    /// Individual malformed properties are dropped with a warning.
    pub fn from_value(raw: &Value) -> Result<Self, SchemaError> {
        let object = raw.as_object().ok_or(SchemaError::NotAnObject)?;

        let id = match object.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(SchemaError::MissingId),
        };

        let elements: Vec<ElementStub> = match object.get("elements") {
            Some(elements @ Value::Array(_)) => serde_json::from_value(elements.clone())?,
            _ => Vec::new(),
        };
        if elements.is_empty() {
            return Err(SchemaError::NoElements(id));
        }

        let mut properties = Vec::new();
        if let Some(Value::Array(raw_properties)) = object.get("properties") {
            for raw_property in raw_properties {
                match serde_json::from_value::<PropertyDefinition>(raw_property.clone()) {
                    Ok(property) => properties.push(property),
                    Err(err) => {
                        warn!(component_id = %id, error = %err, "Skipping malformed property");
                    }
                }
            }
        }

        let description = object
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id,
            elements,
            properties,
            description,
        })
    }

    /// First element label, or "Component <id>"
    pub fn display_name(&self, i18n: &I18n) -> String {
        self.elements
            .first()
            .and_then(|element| element.label.clone())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| {
                let prefix = if i18n.contains("component") {
                    i18n.get("component")
                } else {
                    "Component"
                };
                format!("{} {}", prefix, self.id)
            })
    }

    pub fn property(&self, property_id: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|property| property.id == property_id)
    }

    /// Declared type of a property, `text` when the property is not declared
    pub fn property_kind(&self, property_id: &str) -> PropertyKind {
        self.property(property_id)
            .map(|property| property.kind.clone())
            .unwrap_or(PropertyKind::Text)
    }

    /// Properties that get an editing control
    pub fn editable_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|property| property.is_editable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_component() {
        let component = ComponentDefinition::from_value(&json!({
            "id": "hero01",
            "elements": [{ "id": "e1", "label": "Hero" }],
            "properties": [
                { "id": "title", "type": "text", "label": "Title", "connections": { "e1": ["text"] } },
                { "id": "bg", "type": "image", "label": "Background" }
            ]
        }))
        .unwrap();

        assert_eq!(component.id, "hero01");
        assert_eq!(component.properties.len(), 2);
        assert_eq!(component.editable_properties().count(), 1);
        assert_eq!(component.display_name(&I18n::new()), "Hero");
    }

    #[test]
    fn test_component_without_elements_is_rejected() {
        let err = ComponentDefinition::from_value(&json!({ "id": "x", "elements": [] })).unwrap_err();
        assert!(matches!(err, SchemaError::NoElements(id) if id == "x"));
    }

    #[test]
    fn test_component_without_id_is_rejected() {
        let err = ComponentDefinition::from_value(&json!({ "elements": [{}] })).unwrap_err();
        assert!(matches!(err, SchemaError::MissingId));
    }

    #[test]
    fn test_malformed_property_is_skipped() {
        let component = ComponentDefinition::from_value(&json!({
            "id": "c1",
            "elements": [{}],
            "properties": [
                { "id": "ok", "type": "text", "label": "Ok" },
                { "id": 42, "type": ["bad"] }
            ]
        }))
        .unwrap();

        assert_eq!(component.properties.len(), 1);
        assert_eq!(component.properties[0].id, "ok");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let component = ComponentDefinition::new("abc");
        assert_eq!(component.display_name(&I18n::new()), "Component abc");

        let i18n = I18n::new().with("component", "Komponente");
        assert_eq!(component.display_name(&i18n), "Komponente abc");
    }

    #[test]
    fn test_undeclared_property_kind_is_text() {
        let component = ComponentDefinition::new("abc");
        assert_eq!(component.property_kind("missing"), PropertyKind::Text);
    }
}
