//! Property type → control routing
//!
//! A block's edit surface holds one `PropertyControl` per editable property
//! and forwards every interaction through it. Render failures are contained
//! here: a control that cannot draw its value becomes an inline error box
//! scoped to that property while the rest of the panel keeps working.

use crate::context::ControlContext;
use crate::controls::class::ClassControl;
use crate::controls::gallery::{GalleryAction, GalleryControl};
use crate::controls::icon::{IconAction, IconControl};
use crate::controls::image::{ImageAction, ImageControl};
use crate::controls::link::{LinkAction, LinkControl};
use crate::controls::query::{QueryAction, QueryControl};
use crate::controls::rich_text::{RichTextAction, RichTextControl, RichTextEngine};
use crate::controls::select::SelectControl;
use crate::controls::text::{TextAction, TextControl};
use crate::controls::toggle::{ToggleAction, ToggleControl};
use crate::dropdown::{DropdownAction, SelectOption};
use crate::effect::Effects;
use crate::error::{ControlError, ControlResult};
use crate::node::ControlNode;
use blocks_schema::{PropertyDefinition, PropertyKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::warn;

/// Interaction addressed to one property's control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", content = "payload", rename_all = "camelCase")]
pub enum ControlAction {
    Text(TextAction),
    Toggle(ToggleAction),
    Select(DropdownAction),
    Class(DropdownAction),
    Icon(IconAction),
    Image(ImageAction),
    Gallery(GalleryAction),
    Link(LinkAction),
    Query(QueryAction),
    RichText(RichTextAction),
}

impl ControlAction {
    fn name(&self) -> &'static str {
        match self {
            ControlAction::Text(_) => "text",
            ControlAction::Toggle(_) => "toggle",
            ControlAction::Select(_) => "select",
            ControlAction::Class(_) => "class",
            ControlAction::Icon(_) => "icon",
            ControlAction::Image(_) => "image",
            ControlAction::Gallery(_) => "gallery",
            ControlAction::Link(_) => "link",
            ControlAction::Query(_) => "query",
            ControlAction::RichText(_) => "richText",
        }
    }
}

#[derive(Debug)]
pub enum PropertyControl {
    Text(TextControl),
    Toggle(ToggleControl),
    Select(SelectControl),
    Class(ClassControl),
    Icon(IconControl),
    Image(ImageControl),
    Gallery(GalleryControl),
    Link(LinkControl),
    Query(QueryControl),
    RichText(RichTextControl),
}

impl PropertyControl {
    /// Control for a property; unknown types get the text control
    pub fn new(property: PropertyDefinition, ctx: &ControlContext<'_>) -> Self {
        Self::with_engine(property, ctx, None)
    }

    /// Like [`PropertyControl::new`], handing editor properties a rich text engine
    pub fn with_engine(
        property: PropertyDefinition,
        ctx: &ControlContext<'_>,
        engine: Option<Box<dyn RichTextEngine>>,
    ) -> Self {
        match property.kind.clone() {
            PropertyKind::Text | PropertyKind::Textarea => PropertyControl::Text(TextControl::new(property)),
            PropertyKind::Editor => PropertyControl::RichText(RichTextControl::new(property, engine)),
            PropertyKind::Select => PropertyControl::Select(SelectControl::new(property, ctx.settings)),
            PropertyKind::Toggle => PropertyControl::Toggle(ToggleControl::new(property)),
            PropertyKind::Icon => PropertyControl::Icon(IconControl::new(property)),
            PropertyKind::Image => PropertyControl::Image(ImageControl::new(property)),
            PropertyKind::ImageGallery => PropertyControl::Gallery(GalleryControl::new(property)),
            PropertyKind::Link => PropertyControl::Link(LinkControl::new(property, ctx)),
            PropertyKind::Query => PropertyControl::Query(QueryControl::new(property, ctx)),
            PropertyKind::Class => PropertyControl::Class(ClassControl::new(property, ctx)),
            PropertyKind::Unknown(tag) => {
                warn!(property_id = %property.id, kind = %tag, "Unknown property type, using text control");
                PropertyControl::Text(TextControl::new(property))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PropertyControl::Text(_) => "text",
            PropertyControl::Toggle(_) => "toggle",
            PropertyControl::Select(_) => "select",
            PropertyControl::Class(_) => "class",
            PropertyControl::Icon(_) => "icon",
            PropertyControl::Image(_) => "image",
            PropertyControl::Gallery(_) => "gallery",
            PropertyControl::Link(_) => "link",
            PropertyControl::Query(_) => "query",
            PropertyControl::RichText(_) => "richText",
        }
    }

    /// Initial fetches for controls with deferred option sets
    pub fn mount(&mut self, value: Option<&Value>) -> ControlResult<Effects> {
        match self {
            PropertyControl::Select(control) => Ok(control.mount(value)),
            PropertyControl::Link(control) => control.mount(value),
            PropertyControl::Query(control) => control.mount(value),
            PropertyControl::RichText(control) => control.sync_external(value).map(|_| Vec::new()),
            _ => Ok(Vec::new()),
        }
    }

    /// Stored value changed outside this control
    pub fn value_changed(&mut self, value: Option<&Value>) -> ControlResult<()> {
        match self {
            PropertyControl::RichText(control) => control.sync_external(value),
            _ => Ok(()),
        }
    }

    pub fn handle(
        &mut self,
        action: ControlAction,
        value: Option<&Value>,
        ctx: &ControlContext<'_>,
        now: Instant,
    ) -> ControlResult<Effects> {
        match (&mut *self, action) {
            (PropertyControl::Text(control), ControlAction::Text(action)) => control.handle(action),
            (PropertyControl::Toggle(control), ControlAction::Toggle(action)) => control.handle(action, value),
            (PropertyControl::Select(control), ControlAction::Select(action)) => control.handle(action, value, now),
            (PropertyControl::Class(control), ControlAction::Class(action)) => control.handle(action, value, now),
            (PropertyControl::Icon(control), ControlAction::Icon(action)) => control.handle(action, value, ctx.host),
            (PropertyControl::Image(control), ControlAction::Image(action)) => control.handle(action, value),
            (PropertyControl::Gallery(control), ControlAction::Gallery(action)) => control.handle(action, value),
            (PropertyControl::Link(control), ControlAction::Link(action)) => control.handle(action, value, now),
            (PropertyControl::Query(control), ControlAction::Query(action)) => control.handle(action, value, now),
            (PropertyControl::RichText(control), ControlAction::RichText(action)) => control.handle(action, value),
            (control, action) => Err(ControlError::ActionMismatch {
                property_id: control.property_id().to_string(),
                control: control.name(),
                action: action.name(),
            }),
        }
    }

    /// Due debounced searches
    pub fn poll(&mut self, now: Instant, value: Option<&Value>) -> Effects {
        match self {
            PropertyControl::Select(control) => control.poll(now, value),
            PropertyControl::Link(control) => control.poll(now, value),
            PropertyControl::Query(control) => control.poll(now, value),
            _ => Vec::new(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self {
            PropertyControl::Select(control) => control.next_deadline(),
            PropertyControl::Class(control) => control.dropdown().next_deadline(),
            PropertyControl::Link(control) => control.next_deadline(),
            PropertyControl::Query(control) => control.next_deadline(),
            _ => None,
        }
    }

    /// Hand back a fetch outcome; false when the control dropped it
    pub fn fetch_completed(&mut self, field: &str, seq: u64, result: ControlResult<Vec<SelectOption>>) -> bool {
        match self {
            PropertyControl::Select(control) => control.fetch_completed(seq, result),
            PropertyControl::Link(control) => control.fetch_completed(field, seq, result),
            PropertyControl::Query(control) => control.fetch_completed(field, seq, result),
            _ => false,
        }
    }

    pub fn unmount(&mut self) {
        match self {
            PropertyControl::Select(control) => control.unmount(),
            PropertyControl::Class(control) => control.unmount(),
            PropertyControl::Link(control) => control.unmount(),
            PropertyControl::Query(control) => control.unmount(),
            _ => {}
        }
    }

    pub fn try_render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        match self {
            PropertyControl::Text(control) => control.render(value, ctx),
            PropertyControl::Toggle(control) => control.render(value, ctx),
            PropertyControl::Select(control) => control.render(value, ctx),
            PropertyControl::Class(control) => control.render(value, ctx),
            PropertyControl::Icon(control) => control.render(value, ctx),
            PropertyControl::Image(control) => control.render(value, ctx),
            PropertyControl::Gallery(control) => control.render(value, ctx),
            PropertyControl::Link(control) => control.render(value, ctx),
            PropertyControl::Query(control) => control.render(value, ctx),
            PropertyControl::RichText(control) => control.render(value, ctx),
        }
    }

    /// Rendered control, or an inline error box scoped to this property
    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlNode {
        match self.try_render(value, ctx) {
            Ok(node) => node,
            Err(error) => {
                warn!(property_id = %self.property_id(), control = self.name(), error = %error, "Control failed to render");
                ControlNode::error(error.to_string(), Some(self.property_id().to_string()))
            }
        }
    }

    pub fn property_id(&self) -> &str {
        &self.property().id
    }

    pub fn property(&self) -> &PropertyDefinition {
        match self {
            PropertyControl::Text(control) => control.property(),
            PropertyControl::Toggle(control) => control.property(),
            PropertyControl::Select(control) => control.property(),
            PropertyControl::Class(control) => control.property(),
            PropertyControl::Icon(control) => control.property(),
            PropertyControl::Image(control) => control.property(),
            PropertyControl::Gallery(control) => control.property(),
            PropertyControl::Link(control) => control.property(),
            PropertyControl::Query(control) => control.property(),
            PropertyControl::RichText(control) => control.property(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;
    use blocks_common::{EditorSettings, HostData};
    use serde_json::json;

    #[test]
    fn test_unknown_kind_falls_back_to_text() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let property = PropertyDefinition::new("x", PropertyKind::from("color"), "Color");
        let control = PropertyControl::new(property, &ctx);
        assert_eq!(control.name(), "text");
    }

    #[test]
    fn test_mismatched_action_is_reported() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let mut control = PropertyControl::new(PropertyDefinition::new("title", PropertyKind::Text, "Title"), &ctx);

        let error = control
            .handle(ControlAction::Toggle(ToggleAction::Flip), None, &ctx, Instant::now())
            .unwrap_err();
        assert_eq!(
            error,
            ControlError::ActionMismatch {
                property_id: "title".to_string(),
                control: "text",
                action: "toggle",
            }
        );
    }

    #[test]
    fn test_render_failure_becomes_scoped_error() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let control = PropertyControl::new(PropertyDefinition::new("media", PropertyKind::Image, "Media"), &ctx);

        let node = control.render(Some(&json!(["not", "an", "image"])), &ctx);
        assert!(node.is_error());
        assert_eq!(
            node,
            ControlNode::error("Stored value of 'media' is not a valid image", Some("media".to_string()))
        );
    }

    #[test]
    fn test_action_wire_shape() {
        let action: ControlAction = serde_json::from_value(json!({
            "control": "select",
            "payload": { "action": "pick", "value": "red" }
        }))
        .unwrap();
        assert_eq!(action, ControlAction::Select(DropdownAction::Pick("red".into())));

        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let property = PropertyDefinition::new("color", PropertyKind::Select, "Color")
            .with_options(json!({ "red": "Red", "blue": "Blue" }));
        let mut control = PropertyControl::new(property, &ctx);
        let effects = control.handle(action, None, &ctx, Instant::now()).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!("red"))]);
    }
}
