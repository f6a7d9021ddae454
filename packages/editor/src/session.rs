//! # Block Edit Session
//!
//! Edit-time state of one block instance: the property controls shown in
//! the inspector, the attribute map they write into and the preview region.
//!
//! A session performs no I/O. Interactions and timer polls return a
//! `SessionUpdate` listing the option fetches and preview render the host
//! should run; outcomes are handed back with `fetch_completed` and
//! `render_completed`.

use crate::errors::{EditorError, EditorResult};
use crate::registrar::{localized, BlockRegistration};
use blocks_common::{EditorSettings, HostData};
use blocks_controls::{
    primitives, ControlAction, ControlContext, ControlNode, ControlResult, Effect, Effects, FetchRequest,
    OptionFetcher, PropertyControl, RichTextEngine, SelectOption,
};
use blocks_preview::{PreviewError, PreviewReconciler, RenderJob};
use blocks_schema::{AttributeMap, ComponentDefinition, PropertyDefinition, PropertyKind, PropertyStore};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Work a session hands back to its host
#[derive(Debug, Default, PartialEq)]
pub struct SessionUpdate {
    /// Attribute map changed and should be persisted
    pub changed: bool,

    /// Option fetches to run
    pub fetches: Vec<FetchRequest>,

    /// Preview render to run
    pub render: Option<RenderJob>,
}

impl SessionUpdate {
    fn merge(&mut self, other: SessionUpdate) {
        self.changed |= other.changed;
        self.fetches.extend(other.fetches);
        if other.render.is_some() {
            self.render = other.render;
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.changed && self.fetches.is_empty() && self.render.is_none()
    }
}

/// Editing state of one block instance
#[derive(Debug)]
pub struct BlockEditSession {
    block_name: String,
    component: Arc<ComponentDefinition>,
    store: PropertyStore,
    host: Arc<HostData>,
    settings: Arc<EditorSettings>,
    attrs: AttributeMap,
    controls: Vec<PropertyControl>,
    /// `None` when the host cannot render previews
    preview: Option<PreviewReconciler>,
    mounted: bool,
}

impl BlockEditSession {
    /// Session for an editable block
    ///
    /// Attributes with no component id are adopted; attributes of another
    /// component are rejected.
    pub fn new(
        registration: &BlockRegistration,
        attrs: AttributeMap,
        host: Arc<HostData>,
        settings: Arc<EditorSettings>,
    ) -> EditorResult<Self> {
        if !registration.is_editable() {
            return Err(EditorError::NotEditable(registration.name.clone()));
        }

        let component = Arc::clone(&registration.component);
        let mut attrs = attrs;
        if attrs.component_id.is_empty() {
            attrs.component_id = component.id.clone();
        } else if attrs.component_id != component.id {
            return Err(EditorError::ComponentMismatch {
                expected: component.id.clone(),
                found: attrs.component_id,
            });
        }

        let ctx = ControlContext::new(&host, &settings);
        let controls = component
            .properties
            .iter()
            .filter(|property| shows_control(property))
            .map(|property| PropertyControl::new(property.clone(), &ctx))
            .collect::<Vec<_>>();
        debug!(block_name = %registration.name, controls = controls.len(), "Built property controls");

        let preview = PreviewReconciler::new(registration.name.clone(), &settings, &host.i18n);

        Ok(Self {
            block_name: registration.name.clone(),
            store: PropertyStore::new(Arc::clone(&component)),
            component,
            host,
            settings,
            attrs,
            controls,
            preview: Some(preview),
            mounted: false,
        })
    }

    /// Drop the preview region for hosts without a server renderer
    pub fn without_preview(mut self) -> Self {
        self.preview = None;
        self
    }

    /// Give editor properties a rich text engine
    ///
    /// Properties the factory declines keep the raw fallback.
    pub fn with_rich_text<F>(mut self, factory: F) -> Self
    where
        F: Fn(&PropertyDefinition) -> Option<Box<dyn RichTextEngine>>,
    {
        let ctx = ControlContext::new(&self.host, &self.settings);
        for control in self.controls.iter_mut() {
            if control.property().kind != PropertyKind::Editor {
                continue;
            }
            let property = control.property().clone();
            let engine = factory(&property);
            *control = PropertyControl::with_engine(property, &ctx, engine);
        }
        self
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    pub fn component(&self) -> &ComponentDefinition {
        &self.component
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attrs
    }

    pub fn preview(&self) -> Option<&PreviewReconciler> {
        self.preview.as_ref()
    }

    pub fn control(&self, property_id: &str) -> Option<&PropertyControl> {
        self.controls.iter().find(|control| control.property_id() == property_id)
    }

    pub fn control_ids(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(PropertyControl::property_id)
    }

    /// First render of the block
    ///
    /// Assigns the block id when absent, issues the controls' initial option
    /// fetches and schedules the first preview. A control that fails to
    /// mount is logged and left to render its own error box.
    #[instrument(skip(self, now), fields(block_name = %self.block_name))]
    pub fn mount(&mut self, client_id: &str, now: Instant) -> SessionUpdate {
        let mut update = SessionUpdate {
            changed: self.attrs.assign_block_id(client_id),
            ..SessionUpdate::default()
        };

        for control in self.controls.iter_mut() {
            match control.mount(self.attrs.get(control.property_id())) {
                Ok(effects) => update.fetches.extend(effects.into_iter().filter_map(|effect| match effect {
                    Effect::Fetch(request) => Some(request),
                    Effect::Write(_) => None,
                })),
                Err(error) => {
                    warn!(property_id = %control.property_id(), error = %error, "Control failed to mount");
                }
            }
        }

        if let Some(preview) = self.preview.as_mut() {
            preview.mount();
            preview.attributes_changed(&self.attrs, now);
        }
        self.mounted = true;
        update
    }

    /// Route an interaction to the control of `property_id`
    pub fn handle(&mut self, property_id: &str, action: ControlAction, now: Instant) -> EditorResult<SessionUpdate> {
        if !self.mounted {
            return Err(EditorError::Unmounted);
        }
        let index = self.control_index(property_id)?;

        let ctx = ControlContext::new(&self.host, &self.settings);
        let current = self.attrs.get(property_id).cloned();
        let effects = self.controls[index].handle(action, current.as_ref(), &ctx, now)?;

        Ok(self.apply(index, effects, now))
    }

    /// Replace the attribute map after a change made outside the session
    pub fn set_attributes(&mut self, attrs: AttributeMap, now: Instant) -> EditorResult<()> {
        if attrs.component_id != self.component.id {
            return Err(EditorError::ComponentMismatch {
                expected: self.component.id.clone(),
                found: attrs.component_id,
            });
        }
        if attrs == self.attrs {
            return Ok(());
        }

        self.attrs = attrs;
        for control in self.controls.iter_mut() {
            if let Err(error) = control.value_changed(self.attrs.get(control.property_id())) {
                warn!(property_id = %control.property_id(), error = %error, "Control rejected external value");
            }
        }
        if let Some(preview) = self.preview.as_mut() {
            preview.attributes_changed(&self.attrs, now);
        }
        Ok(())
    }

    /// Fire due debounced searches and the debounced preview render
    pub fn poll(&mut self, now: Instant) -> SessionUpdate {
        let mut update = SessionUpdate::default();
        if !self.mounted {
            return update;
        }

        for index in 0..self.controls.len() {
            let control = &mut self.controls[index];
            let effects = control.poll(now, self.attrs.get(control.property_id()));
            if !effects.is_empty() {
                let applied = self.apply(index, effects, now);
                update.merge(applied);
            }
        }

        if let Some(preview) = self.preview.as_mut() {
            update.render = preview.poll(now);
        }
        update
    }

    /// Earliest instant `poll` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.controls
            .iter()
            .filter_map(PropertyControl::next_deadline)
            .chain(self.preview.as_ref().and_then(PreviewReconciler::next_deadline))
            .min()
    }

    /// Skip the debounce and render the preview now
    pub fn refresh_preview(&mut self) -> Option<RenderJob> {
        if !self.mounted {
            return None;
        }
        self.preview.as_mut()?.request_now(&self.attrs)
    }

    /// Hand back an option fetch outcome; false when it was stale
    pub fn fetch_completed(&mut self, request: &FetchRequest, result: ControlResult<Vec<SelectOption>>) -> bool {
        if !self.mounted {
            return false;
        }
        match self.control_index(&request.property_id) {
            Ok(index) => self.controls[index].fetch_completed(&request.field, request.seq, result),
            Err(_) => false,
        }
    }

    /// Run fetches through `fetcher` concurrently and apply their outcomes
    ///
    /// Returns how many outcomes were applied.
    pub async fn run_fetches(&mut self, fetcher: &dyn OptionFetcher, requests: Vec<FetchRequest>) -> usize {
        let outcomes = join_all(requests.iter().map(|request| fetcher.fetch(request))).await;
        let mut applied = 0;
        for (request, outcome) in requests.iter().zip(outcomes) {
            if self.fetch_completed(request, outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Hand back a preview render outcome
    pub fn render_completed(&mut self, seq: u64, result: Result<String, PreviewError>) -> bool {
        match self.preview.as_mut() {
            Some(preview) if self.mounted => preview.render_completed(seq, result),
            _ => false,
        }
    }

    /// Cancel pending timers and drop late outcomes
    pub fn unmount(&mut self) {
        for control in self.controls.iter_mut() {
            control.unmount();
        }
        if let Some(preview) = self.preview.as_mut() {
            preview.unmount();
        }
        self.mounted = false;
        debug!(block_name = %self.block_name, "Edit session unmounted");
    }

    /// Inspector panel and preview region
    pub fn render(&self) -> ControlNode {
        let ctx = ControlContext::new(&self.host, &self.settings);
        let i18n = &self.host.i18n;
        let mut root = ControlNode::element("div")
            .with_key(self.block_name.clone())
            .with_attr("data-block", self.block_name.clone());

        if !self.controls.is_empty() {
            let panel = primitives::panel("properties", localized(i18n, "properties", "Properties")).with_children(
                self.controls
                    .iter()
                    .map(|control| control.render(self.attrs.get(control.property_id()), &ctx)),
            );
            root = root.with_child(
                ControlNode::element("InspectorControls")
                    .with_key("inspector")
                    .with_child(panel),
            );
        }

        let region = match &self.preview {
            Some(preview) => preview.render(i18n),
            None => ControlNode::element("div")
                .with_key("preview-unavailable")
                .with_style("padding", "20px")
                .with_style("border", "2px dashed #ccc")
                .with_style("text-align", "center")
                .with_child(ControlNode::text(localized(
                    i18n,
                    "serverSideRenderNotAvailable",
                    "Preview is not available",
                ))),
        };
        root.with_child(region)
    }

    fn control_index(&self, property_id: &str) -> EditorResult<usize> {
        self.controls
            .iter()
            .position(|control| control.property_id() == property_id)
            .ok_or_else(|| EditorError::UnknownProperty(property_id.to_string()))
    }

    /// Route a control's effects: writes through the store, fetches to the host
    fn apply(&mut self, index: usize, effects: Effects, now: Instant) -> SessionUpdate {
        let property_id = self.controls[index].property_id().to_string();
        let mut update = SessionUpdate::default();

        for effect in effects {
            match effect {
                Effect::Write(raw) => update.changed |= self.store.update(&mut self.attrs, &property_id, raw),
                Effect::Fetch(request) => update.fetches.push(request),
            }
        }

        if update.changed {
            if let Err(error) = self.controls[index].value_changed(self.attrs.get(&property_id)) {
                warn!(property_id = %property_id, error = %error, "Control rejected stored value");
            }
            if let Some(preview) = self.preview.as_mut() {
                preview.attributes_changed(&self.attrs, now);
            }
        }
        update
    }
}

/// Only properties with an id, a label and a connection get a control
fn shows_control(property: &PropertyDefinition) -> bool {
    !property.id.is_empty() && !property.label.is_empty() && property.has_connections()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::BlockRegistrar;
    use blocks_controls::controls::text::TextAction;
    use serde_json::json;
    use std::time::Duration;

    fn session(enabled: bool) -> EditorResult<BlockEditSession> {
        let enabled_ids = if enabled { json!(["hero"]) } else { json!([]) };
        let host: HostData = serde_json::from_value(json!({
            "components": [{
                "id": "hero",
                "elements": [{ "id": "h", "label": "Hero" }],
                "properties": [
                    { "id": "title", "type": "text", "label": "Title", "connections": { "h": ["text"] } },
                    { "id": "hidden", "type": "text", "label": "Hidden" },
                    { "id": "", "type": "text", "label": "No id", "connections": { "h": ["text"] } }
                ]
            }],
            "enabledComponentIds": enabled_ids
        }))
        .unwrap();
        let host = Arc::new(host);
        let settings = Arc::new(EditorSettings::default());
        let registry = BlockRegistrar::new(Arc::clone(&host), Arc::clone(&settings)).register_all();
        let registration = registry.for_component("hero").unwrap();
        BlockEditSession::new(registration, AttributeMap::default(), host, settings)
    }

    fn change(text: &str) -> ControlAction {
        ControlAction::Text(TextAction::Change(text.to_string()))
    }

    #[test]
    fn test_only_connected_properties_get_controls() {
        let session = session(true).unwrap();
        assert_eq!(session.control_ids().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(session.attributes().component_id, "hero");
    }

    #[test]
    fn test_placeholder_blocks_have_no_session() {
        assert!(matches!(session(false), Err(EditorError::NotEditable(_))));
    }

    #[test]
    fn test_mount_assigns_block_id_once() {
        let mut session = session(true).unwrap();
        let now = Instant::now();
        assert!(session.mount("client-7", now).changed);
        assert_eq!(session.attributes().block_id, "client-7");

        session.unmount();
        assert!(!session.mount("client-8", now).changed);
        assert_eq!(session.attributes().block_id, "client-7");
    }

    #[test]
    fn test_remounted_session_renders_again() {
        let mut session = session(true).unwrap();
        let start = Instant::now();
        session.mount("c1", start);
        session.unmount();
        session.mount("c1", start);

        let update = session.handle("title", change("Hello"), start).unwrap();
        assert!(update.changed);
        let job = session.poll(start + Duration::from_millis(400)).render.unwrap();
        assert_eq!(job.request.properties.as_ref().and_then(|p| p.get("title")), Some(&json!("Hello")));
        assert!(session.refresh_preview().is_some());
    }

    #[test]
    fn test_edit_writes_and_debounces_preview() {
        let mut session = session(true).unwrap();
        let start = Instant::now();
        session.mount("c1", start);

        let update = session.handle("title", change("Hello"), start).unwrap();
        assert!(update.changed);
        assert_eq!(session.attributes().get("title"), Some(&json!("Hello")));

        assert!(session.poll(start + Duration::from_millis(100)).render.is_none());
        let job = session.poll(start + Duration::from_millis(300)).render.unwrap();
        assert_eq!(job.block_name, "component-blocks/hero");
        assert_eq!(job.request.properties.as_ref().and_then(|p| p.get("title")), Some(&json!("Hello")));

        // clearing the text removes the override
        session.handle("title", change(""), start).unwrap();
        assert_eq!(session.attributes().get("title"), None);
    }

    #[test]
    fn test_unknown_property_and_unmounted_session() {
        let mut session = session(true).unwrap();
        let now = Instant::now();
        assert!(matches!(session.handle("title", change("x"), now), Err(EditorError::Unmounted)));

        session.mount("c1", now);
        assert!(matches!(
            session.handle("hidden", change("x"), now),
            Err(EditorError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_render_without_preview_shows_notice() {
        let session = session(true).unwrap().without_preview();
        let tree = session.render();
        assert!(tree.find_key("inspector").is_some());
        assert_eq!(
            tree.find_key("preview-unavailable").map(|node| node.text_content()).as_deref(),
            Some("Preview is not available")
        );
        assert!(tree.find_key("render-wrapper").is_none());
    }

    #[test]
    fn test_foreign_attributes_are_rejected() {
        let mut session = session(true).unwrap();
        let result = session.set_attributes(AttributeMap::for_component("card"), Instant::now());
        assert!(matches!(result, Err(EditorError::ComponentMismatch { .. })));
    }
}
