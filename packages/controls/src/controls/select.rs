use crate::context::ControlContext;
use crate::dropdown::{Dropdown, DropdownAction, SelectOption};
use crate::effect::{Effect, Effects};
use crate::error::ControlResult;
use crate::node::ControlNode;
use blocks_common::EditorSettings;
use blocks_schema::PropertyDefinition;
use serde_json::Value;
use std::time::Instant;

/// Select property backed by the dropdown engine
#[derive(Debug, Clone)]
pub struct SelectControl {
    property: PropertyDefinition,
    dropdown: Dropdown,
}

impl SelectControl {
    pub fn new(property: PropertyDefinition, settings: &EditorSettings) -> Self {
        let dropdown = Dropdown::for_property(&property, settings);
        Self::with_dropdown(property, dropdown)
    }

    pub(crate) fn with_dropdown(property: PropertyDefinition, dropdown: Dropdown) -> Self {
        Self { property, dropdown }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn dropdown(&self) -> &Dropdown {
        &self.dropdown
    }

    /// Initial fetch of a deferred option set
    pub fn mount(&mut self, value: Option<&Value>) -> Effects {
        self.dropdown.mount(value).map(Effect::Fetch).into_iter().collect()
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        Ok(self.dropdown.render(value, ctx))
    }

    pub fn handle(&mut self, action: DropdownAction, value: Option<&Value>, now: Instant) -> ControlResult<Effects> {
        Ok(self
            .dropdown
            .apply(action, value, now)
            .map(Effect::Write)
            .into_iter()
            .collect())
    }

    pub fn poll(&mut self, now: Instant, value: Option<&Value>) -> Effects {
        self.dropdown.poll(now, value).map(Effect::Fetch).into_iter().collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.dropdown.next_deadline()
    }

    pub fn fetch_completed(&mut self, seq: u64, result: ControlResult<Vec<SelectOption>>) -> bool {
        self.dropdown.fetch_completed(seq, result)
    }

    pub fn unmount(&mut self) {
        self.dropdown.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::last_write;
    use blocks_common::HostData;
    use blocks_schema::PropertyKind;
    use serde_json::json;
    use std::time::Duration;

    fn tone() -> PropertyDefinition {
        PropertyDefinition::new("tone", PropertyKind::Select, "Tone")
            .with_options(json!({ "warm": "Warm", "cool": "Cool" }))
            .multiple()
    }

    #[test]
    fn test_pick_and_clear_write_through() {
        let settings = EditorSettings::default();
        let mut control = SelectControl::new(tone(), &settings);
        let now = Instant::now();

        let effects = control.handle(DropdownAction::Pick("warm".into()), None, now).unwrap();
        assert_eq!(last_write(&effects), Some(&json!(["warm"])));

        let effects = control.handle(DropdownAction::Clear, Some(&json!(["warm"])), now).unwrap();
        assert_eq!(last_write(&effects), Some(&json!([])));

        assert!(control.handle(DropdownAction::Toggle, None, now).unwrap().is_empty());
        assert!(control.dropdown().is_open());
    }

    #[test]
    fn test_static_select_never_fetches() {
        let settings = EditorSettings::default();
        let mut control = SelectControl::new(tone(), &settings);
        assert!(control.mount(None).is_empty());
    }

    #[test]
    fn test_deferred_select_fetches_on_mount_and_search() {
        let settings = EditorSettings::default();
        let descriptor = json!({ "action": "bricks_get_posts" }).as_object().cloned().unwrap();
        let property = PropertyDefinition::new("related", PropertyKind::Select, "Related").with_options_ajax(descriptor);
        let mut control = SelectControl::new(property, &settings);
        let now = Instant::now();

        let effects = control.mount(Some(&json!("12")));
        let request = effects[0].as_fetch().unwrap();
        assert_eq!(request.include, vec!["12".to_string()]);

        control.handle(DropdownAction::Search("about".into()), None, now).unwrap();
        assert_eq!(control.next_deadline(), Some(now + settings.search_debounce()));
        let effects = control.poll(now + Duration::from_secs(1), None);
        assert_eq!(effects[0].as_fetch().and_then(|r| r.search.as_deref()), Some("about"));
    }

    #[test]
    fn test_render_shows_selected_labels() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let control = SelectControl::new(tone(), &settings);

        let tree = control.render(Some(&json!(["cool"])), &ctx).unwrap();
        assert_eq!(tree.find_key("selected-cool").map(|n| n.text_content()).as_deref(), Some("Cool"));
        assert!(tree.find_key("clear-button").is_some());
    }
}
