use crate::context::ControlContext;
use crate::dropdown::value_text;
use crate::effect::{Effect, Effects};
use crate::error::{ControlError, ControlResult};
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::{PropertyDefinition, PropertyKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum TextAction {
    Change(String),
}

/// Single-line input; textarea properties get a multi-line one
#[derive(Debug, Clone)]
pub struct TextControl {
    property: PropertyDefinition,
    multiline: bool,
}

impl TextControl {
    pub fn new(property: PropertyDefinition) -> Self {
        let multiline = property.kind == PropertyKind::Textarea;
        Self { property, multiline }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn render(&self, value: Option<&Value>, _ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let text = match value {
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                return Err(ControlError::InvalidValue {
                    property_id: self.property.id.clone(),
                    expected: "text",
                })
            }
            Some(value) => value_text(value),
            None => String::new(),
        };

        let default_text = self.property.default.as_ref().map(value_text);
        let placeholder = self.property.placeholder.as_deref().or(default_text.as_deref());

        let input = if self.multiline {
            primitives::textarea(&self.property.id, &self.property.label, &text, placeholder)
        } else {
            primitives::text_input(&self.property.id, &self.property.label, &text, placeholder)
        };
        Ok(input.with_attr("data-action", "change"))
    }

    /// Empty input clears the override
    pub fn handle(&mut self, action: TextAction) -> ControlResult<Effects> {
        match action {
            TextAction::Change(text) => Ok(vec![Effect::Write(Value::String(text))]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_common::{EditorSettings, HostData};
    use serde_json::json;

    #[test]
    fn test_render_uses_default_as_placeholder() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let property = PropertyDefinition::new("title", PropertyKind::Text, "Title").with_default(json!("Hello"));
        let control = TextControl::new(property);

        let node = control.render(None, &ctx).unwrap();
        assert_eq!(node.tag(), Some("TextControl"));
        assert_eq!(node.attr("placeholder"), Some("Hello"));
        assert_eq!(node.attr("value"), Some(""));
    }

    #[test]
    fn test_object_value_is_reported() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let control = TextControl::new(PropertyDefinition::new("title", PropertyKind::Text, "Title"));
        assert!(control.render(Some(&json!({ "a": 1 })), &ctx).is_err());
    }

    #[test]
    fn test_textarea_is_multiline() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let control = TextControl::new(PropertyDefinition::new("bio", PropertyKind::Textarea, "Bio"));
        let node = control.render(Some(&json!("x")), &ctx).unwrap();
        assert_eq!(node.tag(), Some("TextareaControl"));
    }

    #[test]
    fn test_change_writes_raw_text() {
        let mut control = TextControl::new(PropertyDefinition::new("title", PropertyKind::Text, "Title"));
        let effects = control.handle(TextAction::Change(String::new())).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!(""))]);
    }
}
