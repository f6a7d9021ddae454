//! Rich text control
//!
//! The editing surface belongs to an external engine. This control keeps the
//! engine, the raw-markup textarea and the stored value in step:
//!
//! - engine edits and blur write to the store,
//! - an external store change is pushed into the engine only while there are
//!   no unacknowledged local edits,
//! - switching tabs copies content into the mode being shown.

use crate::context::ControlContext;
use crate::dropdown::value_text;
use crate::effect::{Effect, Effects};
use crate::error::{ControlError, ControlResult};
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_EDITOR: AtomicU64 = AtomicU64::new(1);

/// Embedded rich text editor provided by the host
pub trait RichTextEngine: Debug + Send {
    fn content(&self) -> String;

    fn set_content(&mut self, html: &str) -> ControlResult<()>;

    fn name(&self) -> &str;
}

/// Engine holding markup in memory, backing the raw fallback
#[derive(Debug, Default, Clone)]
pub struct MemoryEngine {
    content: String,
}

impl RichTextEngine for MemoryEngine {
    fn content(&self) -> String {
        self.content.clone()
    }

    fn set_content(&mut self, html: &str) -> ControlResult<()> {
        self.content = html.to_string();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RichTextMode {
    Visual,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum RichTextAction {
    /// Engine reported new content (change, keyup, undo, redo)
    Edit(String),
    Blur,
    /// Textarea input in raw mode
    RawInput(String),
    SwitchMode(RichTextMode),
}

#[derive(Debug)]
pub struct RichTextControl {
    property: PropertyDefinition,
    editor_id: String,
    engine: Option<Box<dyn RichTextEngine>>,
    mode: RichTextMode,
    raw: String,
    /// Content written locally that the store has not echoed back yet
    pending: Option<String>,
}

impl RichTextControl {
    /// Without an engine the control edits raw markup only
    pub fn new(property: PropertyDefinition, engine: Option<Box<dyn RichTextEngine>>) -> Self {
        let editor_id = format!("editor-{}-{}", property.id, NEXT_EDITOR.fetch_add(1, Ordering::Relaxed));
        let mode = if engine.is_some() {
            RichTextMode::Visual
        } else {
            warn!(property_id = %property.id, "No rich text engine, falling back to raw markup");
            RichTextMode::Raw
        };

        Self {
            property,
            editor_id,
            engine,
            mode,
            raw: String::new(),
            pending: None,
        }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn mode(&self) -> RichTextMode {
        self.mode
    }

    pub fn editor_id(&self) -> &str {
        &self.editor_id
    }

    pub fn has_local_edits(&self) -> bool {
        self.pending.is_some()
    }

    fn stored_text(&self, value: Option<&Value>) -> ControlResult<String> {
        match value {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::Array(_)) | Some(Value::Object(_)) => Err(ControlError::InvalidValue {
                property_id: self.property.id.clone(),
                expected: "rich text",
            }),
            Some(other) => Ok(value_text(other)),
        }
    }

    /// Drop a failed engine and continue on the textarea
    fn engine_failed(&mut self, error: ControlError) {
        warn!(property_id = %self.property.id, error = %error, "Rich text engine failed, switching to raw markup");
        if let Some(engine) = self.engine.take() {
            self.raw = engine.content();
        }
        self.mode = RichTextMode::Raw;
    }

    fn push_to_engine(&mut self, text: &str) {
        let result = match self.engine.as_mut() {
            Some(engine) if engine.content() != text => engine.set_content(text),
            _ => Ok(()),
        };
        if let Err(error) = result {
            self.engine_failed(error);
        }
    }

    /// Apply the stored value after a store change
    pub fn sync_external(&mut self, value: Option<&Value>) -> ControlResult<()> {
        let stored = self.stored_text(value)?;

        match &self.pending {
            Some(pending) if *pending == stored => {
                self.pending = None;
            }
            Some(_) => {
                debug!(property_id = %self.property.id, "Keeping local rich text edits over external change");
                return Ok(());
            }
            None => {}
        }

        self.push_to_engine(&stored);
        if self.raw != stored {
            self.raw = stored;
        }
        Ok(())
    }

    fn write_if_changed(&mut self, content: String, stored: &str) -> Effects {
        if content == stored {
            return Vec::new();
        }
        self.pending = Some(content.clone());
        vec![Effect::Write(Value::String(content))]
    }

    pub fn handle(&mut self, action: RichTextAction, value: Option<&Value>) -> ControlResult<Effects> {
        let stored = self.stored_text(value)?;

        let effects = match action {
            RichTextAction::Edit(content) => {
                self.push_to_engine(&content);
                self.raw = content.clone();
                self.write_if_changed(content, &stored)
            }
            RichTextAction::Blur => match self.engine.as_ref() {
                Some(engine) if self.mode == RichTextMode::Visual => {
                    let content = engine.content();
                    self.write_if_changed(content, &stored)
                }
                _ => Vec::new(),
            },
            RichTextAction::RawInput(text) => {
                self.raw = text.clone();
                self.write_if_changed(text, &stored)
            }
            RichTextAction::SwitchMode(mode) => {
                self.switch_mode(mode);
                Vec::new()
            }
        };
        Ok(effects)
    }

    fn switch_mode(&mut self, mode: RichTextMode) {
        match mode {
            RichTextMode::Raw => {
                if let Some(engine) = self.engine.as_ref() {
                    self.raw = engine.content();
                }
                self.mode = RichTextMode::Raw;
            }
            RichTextMode::Visual => {
                if self.engine.is_none() {
                    return;
                }
                let raw = self.raw.clone();
                self.push_to_engine(&raw);
                if self.engine.is_some() {
                    self.mode = RichTextMode::Visual;
                }
            }
        }
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let stored = self.stored_text(value)?;
        let visual = self.mode == RichTextMode::Visual;

        let mut root = ControlNode::element("div")
            .with_key(self.property.id.clone())
            .with_child(
                ControlNode::element("label")
                    .with_key("label")
                    .with_child(ControlNode::text(self.property.label.clone())),
            );

        if self.engine.is_some() {
            root = root.with_child(
                ControlNode::element("div")
                    .with_key("editor-tabs")
                    .with_child(
                        primitives::button("switch-visual", "switchMode", ctx.t("visual"))
                            .with_attr("data-value", "visual")
                            .with_flag("isPressed", visual),
                    )
                    .with_child(
                        primitives::button("switch-raw", "switchMode", ctx.t("text"))
                            .with_attr("data-value", "raw")
                            .with_flag("isPressed", !visual),
                    ),
            );
        }

        let body = match self.engine.as_ref() {
            Some(engine) if visual => ControlNode::element("RichTextEditor")
                .with_key("engine")
                .with_attr("id", self.editor_id.clone())
                .with_attr("data-engine", engine.name())
                .with_attr("data-action", "edit")
                .with_child(ControlNode::markup(engine.content())),
            _ => {
                let text = if self.engine.is_some() || self.pending.is_some() { &self.raw } else { &stored };
                primitives::textarea("raw", "", text, None)
                    .with_attr("id", self.editor_id.clone())
                    .with_attr("data-action", "rawInput")
            }
        };

        Ok(root.with_child(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_common::{EditorSettings, HostData};
    use blocks_schema::PropertyKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn control() -> RichTextControl {
        RichTextControl::new(
            PropertyDefinition::new("body", PropertyKind::Editor, "Body"),
            Some(Box::new(MemoryEngine::default())),
        )
    }

    #[derive(Debug)]
    struct BrokenEngine;

    impl RichTextEngine for BrokenEngine {
        fn content(&self) -> String {
            String::new()
        }

        fn set_content(&mut self, _html: &str) -> ControlResult<()> {
            Err(ControlError::Engine("not initialized".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_edit_writes_only_changes() {
        let mut control = control();
        let stored = json!("<p>a</p>");
        control.sync_external(Some(&stored)).unwrap();

        let effects = control.handle(RichTextAction::Edit("<p>a</p>".into()), Some(&stored)).unwrap();
        assert!(effects.is_empty());

        let effects = control.handle(RichTextAction::Edit("<p>ab</p>".into()), Some(&stored)).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!("<p>ab</p>"))]);
        assert!(control.has_local_edits());
    }

    #[test]
    fn test_external_change_waits_for_local_edits() {
        let mut control = control();
        control.handle(RichTextAction::Edit("<p>local</p>".into()), None).unwrap();

        control.sync_external(Some(&json!("<p>remote</p>"))).unwrap();
        let tree = control.render(Some(&json!("<p>remote</p>")), &ControlContext::new(&HostData::default(), &EditorSettings::default())).unwrap();
        assert_eq!(tree.text_content(), "Bodyvisualtext");
        assert!(tree.descendants().iter().any(|node| *node == &ControlNode::markup("<p>local</p>")));

        // store echoes the local write, then later external changes apply
        control.sync_external(Some(&json!("<p>local</p>"))).unwrap();
        assert!(!control.has_local_edits());
        control.sync_external(Some(&json!("<p>remote</p>"))).unwrap();
        let tree = control.render(Some(&json!("<p>remote</p>")), &ControlContext::new(&HostData::default(), &EditorSettings::default())).unwrap();
        assert!(tree.descendants().iter().any(|node| *node == &ControlNode::markup("<p>remote</p>")));
    }

    #[test]
    fn test_switch_mode_syncs_content() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let mut control = control();
        control.handle(RichTextAction::Edit("<b>x</b>".into()), None).unwrap();

        control.handle(RichTextAction::SwitchMode(RichTextMode::Raw), None).unwrap();
        let tree = control.render(None, &ctx).unwrap();
        assert_eq!(tree.find_key("raw").and_then(|node| node.attr("value")), Some("<b>x</b>"));

        let effects = control.handle(RichTextAction::RawInput("<i>y</i>".into()), None).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!("<i>y</i>"))]);

        control.handle(RichTextAction::SwitchMode(RichTextMode::Visual), None).unwrap();
        assert_eq!(control.mode(), RichTextMode::Visual);
        let tree = control.render(None, &ctx).unwrap();
        assert!(tree.descendants().iter().any(|node| *node == &ControlNode::markup("<i>y</i>")));
    }

    #[test]
    fn test_missing_or_failing_engine_falls_back_to_raw() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);

        let control = RichTextControl::new(PropertyDefinition::new("body", PropertyKind::Editor, "Body"), None);
        assert_eq!(control.mode(), RichTextMode::Raw);
        let tree = control.render(Some(&json!("hello")), &ctx).unwrap();
        assert_eq!(tree.find_key("raw").and_then(|node| node.attr("value")), Some("hello"));
        assert!(tree.find_key("editor-tabs").is_none());

        let mut broken = RichTextControl::new(
            PropertyDefinition::new("body", PropertyKind::Editor, "Body"),
            Some(Box::new(BrokenEngine)),
        );
        broken.sync_external(Some(&json!("hello"))).unwrap();
        assert_eq!(broken.mode(), RichTextMode::Raw);
        let tree = broken.render(Some(&json!("hello")), &ctx).unwrap();
        assert_eq!(tree.find_key("raw").and_then(|node| node.attr("value")), Some("hello"));
    }

    #[test]
    fn test_object_value_is_rejected() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        assert!(control().render(Some(&json!({ "a": 1 })), &ctx).is_err());
    }
}
