//! # Dropdown / Option Engine
//!
//! Shared state machine behind every searchable option list: select and
//! class properties, the link post picker and term list, and the query
//! control's post/taxonomy/role pickers.
//!
//! ```text
//!   mount ──► initial fetch (include = current values)
//!   search ─► debounce ──► len >= min  : fetch(search)
//!                      ├─► len == 0    : fetch(include = current values)
//!                      └─► otherwise   : nothing ("type to search")
//!   fetch_completed(seq) ─► accepted only for the latest request
//! ```
//!
//! The engine never writes properties itself. `pick` and `clear` return the
//! raw value for the property store.

use crate::context::ControlContext;
use crate::error::ControlResult;
use crate::fetch::FetchRequest;
use crate::node::ControlNode;
use crate::primitives;
use blocks_common::{EditorSettings, TimerSlot};
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, warn};

/// Static option lists longer than this always get a search field
const SEARCH_THRESHOLD: usize = 10;

/// Map keys containing this marker are group separators, not options
const GROUP_TITLE_MARKER: &str = "GroupTitle";

/// Single choice; values are normalized to strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Options from a `value → label` map, skipping group titles
    pub fn from_map(map: &Map<String, Value>) -> Vec<SelectOption> {
        map.iter()
            .filter(|(key, _)| !key.contains(GROUP_TITLE_MARKER))
            .map(|(key, label)| SelectOption::new(key.clone(), value_text(label)))
            .collect()
    }

    /// Options from an array of `{value, label}` objects
    pub fn from_array(items: &[Value]) -> Vec<SelectOption> {
        items
            .iter()
            .filter_map(|item| {
                let value = item.get("value")?;
                let label = item.get("label")?;
                Some(SelectOption::new(value_text(value), value_text(label)))
            })
            .collect()
    }

    /// Options declared on a property in either accepted shape
    pub fn parse(raw: Option<&Value>) -> Vec<SelectOption> {
        match raw {
            Some(Value::Array(items)) => Self::from_array(items),
            Some(Value::Object(map)) => Self::from_map(map),
            _ => Vec::new(),
        }
    }

    /// Options from `(value, label)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<SelectOption> {
        pairs
            .into_iter()
            .map(|(value, label)| SelectOption::new(value, label))
            .collect()
    }
}

/// Scalar as option text; numbers and booleans are stringified
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => String::new(),
        other => other.to_string(),
    }
}

/// Stored selection as option values
pub fn selected_values(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_text)
            .filter(|value| !value.is_empty())
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            let text = value_text(other);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

/// Interaction with a dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum DropdownAction {
    /// Click on the trigger
    Toggle,
    /// Interaction outside the control
    Close,
    Search(String),
    Pick(String),
    Clear,
}

#[derive(Debug, Clone)]
pub struct Dropdown {
    property_id: String,
    field: String,
    label: String,
    placeholder: Option<String>,
    help: Option<String>,
    multiple: bool,
    searchable: bool,
    descriptor: Option<Map<String, Value>>,
    static_options: Vec<SelectOption>,
    fetched: Vec<SelectOption>,
    open: bool,
    search_term: String,
    loading: bool,
    search_timer: TimerSlot<()>,
    in_flight: Option<u64>,
    next_seq: u64,
    min_search_chars: usize,
    active: bool,
}

impl Dropdown {
    pub fn new(
        property_id: impl Into<String>,
        field: impl Into<String>,
        options: Vec<SelectOption>,
        settings: &EditorSettings,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            field: field.into(),
            label: String::new(),
            placeholder: None,
            help: None,
            multiple: false,
            searchable: false,
            descriptor: None,
            static_options: options,
            fetched: Vec::new(),
            open: false,
            search_term: String::new(),
            loading: false,
            search_timer: TimerSlot::new(settings.search_debounce()),
            in_flight: None,
            next_seq: 0,
            min_search_chars: settings.min_search_chars,
            active: true,
        }
    }

    /// Dropdown for a select property
    pub fn for_property(property: &PropertyDefinition, settings: &EditorSettings) -> Self {
        let mut dropdown = Self::new(
            property.id.clone(),
            "options",
            SelectOption::parse(property.options.as_ref()),
            settings,
        )
        .with_label(property.label.clone())
        .multiple(property.multiple)
        .searchable(property.searchable);
        dropdown.placeholder = property.placeholder.clone();
        dropdown.help = property.help.clone();
        dropdown.descriptor = property.options_ajax.clone();
        dropdown
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn deferred(mut self, descriptor: Map<String, Value>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_deferred(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn set_static_options(&mut self, options: Vec<SelectOption>) {
        self.static_options = options;
    }

    /// Replace the fetch descriptor, dropping results of the old one
    pub fn set_descriptor(&mut self, descriptor: Option<Map<String, Value>>) {
        self.descriptor = descriptor;
        self.fetched.clear();
        self.in_flight = None;
        self.loading = false;
        self.search_timer.cancel();
    }

    /// Initial fetch when the control appears
    pub fn mount(&mut self, current: Option<&Value>) -> Option<FetchRequest> {
        self.active = true;
        self.reload(current)
    }

    /// Fetch the unfiltered set, including the current selection
    pub fn reload(&mut self, current: Option<&Value>) -> Option<FetchRequest> {
        if !self.active || !self.is_deferred() {
            return None;
        }
        Some(self.issue(None, selected_values(current)))
    }

    fn issue(&mut self, search: Option<String>, include: Vec<String>) -> FetchRequest {
        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        self.loading = true;

        debug!(
            property_id = %self.property_id,
            field = %self.field,
            seq = self.next_seq,
            search = ?search,
            "Issuing option fetch"
        );

        FetchRequest {
            seq: self.next_seq,
            property_id: self.property_id.clone(),
            field: self.field.clone(),
            descriptor: self.descriptor.clone().unwrap_or_default(),
            search,
            include,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    /// Interaction outside the control
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Update the search field; deferred lists schedule a debounced fetch
    pub fn set_search(&mut self, term: impl Into<String>, now: Instant) {
        self.search_term = term.into();
        if self.is_deferred() && self.active {
            self.search_timer.schedule(now, ());
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.search_timer.deadline()
    }

    /// Run the search debounce if it elapsed
    pub fn poll(&mut self, now: Instant, current: Option<&Value>) -> Option<FetchRequest> {
        self.search_timer.poll(now)?;
        if !self.active {
            return None;
        }

        let length = self.search_term.chars().count();
        if length >= self.min_search_chars {
            let search = self.search_term.clone();
            Some(self.issue(Some(search), Vec::new()))
        } else if length == 0 {
            self.reload(current)
        } else {
            None
        }
    }

    /// Deliver the outcome of a fetch
    ///
    /// Returns `false` when the result belongs to a superseded request or the
    /// dropdown was unmounted. A failure leaves an empty, usable list.
    pub fn fetch_completed(&mut self, seq: u64, result: ControlResult<Vec<SelectOption>>) -> bool {
        if !self.active || self.in_flight != Some(seq) {
            debug!(property_id = %self.property_id, seq, "Ignoring stale option fetch");
            return false;
        }

        self.in_flight = None;
        self.loading = false;
        match result {
            Ok(options) => self.fetched = options,
            Err(err) => {
                warn!(property_id = %self.property_id, field = %self.field, error = %err, "Option fetch failed");
                self.fetched.clear();
            }
        }
        true
    }

    /// Cancel timers and abandon in-flight fetches
    pub fn unmount(&mut self) {
        self.active = false;
        self.open = false;
        self.loading = false;
        self.in_flight = None;
        self.search_timer.cancel();
    }

    /// Static options followed by fetched ones, first occurrence wins
    pub fn options(&self) -> Vec<SelectOption> {
        let mut out: Vec<SelectOption> = Vec::with_capacity(self.static_options.len() + self.fetched.len());
        for option in self.static_options.iter().chain(self.fetched.iter()) {
            if !out.iter().any(|existing| existing.value == option.value) {
                out.push(option.clone());
            }
        }
        out
    }

    /// Options matching the search term, case-insensitively by label
    pub fn visible_options(&self) -> Vec<SelectOption> {
        let options = self.options();
        if self.search_term.is_empty() {
            return options;
        }
        let needle = self.search_term.to_lowercase();
        options
            .into_iter()
            .filter(|option| option.label.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selected_options(&self, current: Option<&Value>) -> Vec<SelectOption> {
        let selected = selected_values(current);
        self.options()
            .into_iter()
            .filter(|option| selected.contains(&option.value))
            .collect()
    }

    pub fn label_for(&self, value: &str) -> Option<String> {
        self.options()
            .into_iter()
            .find(|option| option.value == value)
            .map(|option| option.label)
    }

    pub fn show_search(&self) -> bool {
        self.is_deferred() || self.searchable || self.options().len() > SEARCH_THRESHOLD
    }

    /// Raw value after picking `value`
    ///
    /// Multiple: toggles membership, keeping insertion order, and stays open.
    /// Single: picking the current value deselects it; the panel closes.
    pub fn pick(&mut self, value: &str, current: Option<&Value>) -> Value {
        if self.multiple {
            let mut items: Vec<Value> = match current {
                Some(Value::Array(items)) => items.clone(),
                Some(other) if !selected_values(Some(other)).is_empty() => vec![other.clone()],
                _ => Vec::new(),
            };
            let before = items.len();
            items.retain(|item| value_text(item) != value);
            if items.len() == before {
                items.push(Value::String(value.to_string()));
            }
            Value::Array(items)
        } else {
            self.open = false;
            if selected_values(current).iter().any(|selected| selected == value) {
                Value::String(String::new())
            } else {
                Value::String(value.to_string())
            }
        }
    }

    /// Apply an interaction, returning the raw value to store if any
    pub fn apply(&mut self, action: DropdownAction, current: Option<&Value>, now: Instant) -> Option<Value> {
        match action {
            DropdownAction::Toggle => {
                self.toggle_open();
                None
            }
            DropdownAction::Close => {
                self.close();
                None
            }
            DropdownAction::Search(term) => {
                self.set_search(term, now);
                None
            }
            DropdownAction::Pick(value) => Some(self.pick(&value, current)),
            DropdownAction::Clear => Some(self.clear()),
        }
    }

    /// Raw value for the clear button
    pub fn clear(&self) -> Value {
        if self.multiple {
            Value::Array(Vec::new())
        } else {
            Value::Null
        }
    }

    pub fn render(&self, current: Option<&Value>, ctx: &ControlContext<'_>) -> ControlNode {
        let selected = self.selected_options(current);
        let has_selection = !selected.is_empty();

        let selection = if has_selection {
            if self.multiple {
                ControlNode::element("div")
                    .with_key("selected-items")
                    .with_children(selected.iter().map(|option| {
                        ControlNode::element("span")
                            .with_key(format!("selected-{}", option.value))
                            .with_child(ControlNode::text(option.label.clone()))
                    }))
            } else {
                ControlNode::element("span")
                    .with_key("selected-value")
                    .with_child(ControlNode::text(selected[0].label.clone()))
            }
        } else {
            let placeholder = self
                .placeholder
                .clone()
                .unwrap_or_else(|| ctx.t("select").to_string());
            ControlNode::element("span")
                .with_key("placeholder")
                .with_child(ControlNode::text(placeholder))
        };

        let trigger = ControlNode::element("div")
            .with_key("selection-trigger")
            .with_attr("data-action", "toggle")
            .with_child(selection)
            .with_child(
                ControlNode::element("span")
                    .with_key("dropdown-arrow")
                    .with_flag("data-open", self.open)
                    .with_child(ControlNode::text("▼")),
            );

        let mut container = ControlNode::element("div")
            .with_key(format!("dropdown-{}", self.field))
            .with_attr("data-control", "select")
            .with_attr("data-field", self.field.clone())
            .with_child(trigger);

        if has_selection {
            container = container.with_child(primitives::button("clear-button", "clear", "×"));
        }
        if self.open {
            container = container.with_child(self.render_panel(current, ctx));
        }

        primitives::base_control(&self.field, &self.label, self.help.as_deref()).with_child(container)
    }

    fn render_panel(&self, current: Option<&Value>, ctx: &ControlContext<'_>) -> ControlNode {
        let mut panel = ControlNode::element("div").with_key("dropdown-panel");

        if self.show_search() {
            panel = panel.with_child(
                primitives::text_input("search", "", &self.search_term, Some(ctx.t("searchOptions")))
                    .with_key("search-input")
                    .with_attr("data-action", "search"),
            );
        }

        let list = ControlNode::element("div").with_key("options-list");
        let visible = self.visible_options();
        let list = if self.loading {
            list.with_child(
                ControlNode::element("div")
                    .with_key("loading")
                    .with_child(ControlNode::text(ctx.t("loading"))),
            )
        } else if visible.is_empty() {
            let length = self.search_term.chars().count();
            let message = if length > 0 && length < self.min_search_chars {
                ctx.t("typeToSearch")
            } else {
                ctx.t("noOptionsFound")
            };
            list.with_child(
                ControlNode::element("div")
                    .with_key("no-results")
                    .with_child(ControlNode::text(message)),
            )
        } else {
            let selected = selected_values(current);
            list.with_children(visible.into_iter().map(|option| {
                let is_selected = selected.contains(&option.value);
                let mut item = ControlNode::element("div")
                    .with_key(format!("option-{}", option.value))
                    .with_attr("data-action", "pick")
                    .with_attr("data-value", option.value.clone())
                    .with_flag("data-selected", is_selected);
                if self.multiple {
                    item = item.with_child(primitives::checkbox_mark(is_selected));
                }
                item.with_child(ControlNode::element("span").with_child(ControlNode::text(option.label)))
            }))
        };

        panel.with_child(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;
    use blocks_common::HostData;
    use serde_json::json;
    use std::time::Duration;

    fn settings() -> EditorSettings {
        EditorSettings::default()
    }

    fn deferred() -> Dropdown {
        let descriptor = json!({ "action": "bricks_get_posts" }).as_object().cloned().unwrap();
        Dropdown::new("related", "options", Vec::new(), &settings())
            .multiple(true)
            .deferred(descriptor)
    }

    #[test]
    fn test_parse_options_skips_group_titles() {
        let options = SelectOption::parse(Some(&json!({
            "builtInGroupTitle": "Built-in",
            "a": "Alpha",
            "b": "Beta"
        })));
        assert_eq!(options, vec![SelectOption::new("a", "Alpha"), SelectOption::new("b", "Beta")]);

        let options = SelectOption::parse(Some(&json!([
            { "value": 1, "label": "One" },
            { "value": "x" },
            { "label": "nothing" }
        ])));
        assert_eq!(options, vec![SelectOption::new("1", "One")]);
    }

    #[test]
    fn test_multi_pick_toggles_in_insertion_order() {
        let mut dropdown = Dropdown::new("tone", "options", Vec::new(), &settings()).multiple(true);
        dropdown.toggle_open();

        let first = dropdown.pick("warm", None);
        assert_eq!(first, json!(["warm"]));
        let second = dropdown.pick("cool", Some(&first));
        assert_eq!(second, json!(["warm", "cool"]));
        let third = dropdown.pick("warm", Some(&second));
        assert_eq!(third, json!(["cool"]));
        assert!(dropdown.is_open());

        let twice = dropdown.pick("cool", Some(&third));
        assert_eq!(twice, json!([]));
    }

    #[test]
    fn test_single_pick_closes_and_deselects() {
        let mut dropdown = Dropdown::new("size", "options", Vec::new(), &settings());
        dropdown.toggle_open();
        assert_eq!(dropdown.pick("lg", None), json!("lg"));
        assert!(!dropdown.is_open());
        assert_eq!(dropdown.pick("lg", Some(&json!("lg"))), json!(""));
        assert_eq!(dropdown.clear(), Value::Null);
    }

    #[test]
    fn test_search_debounce_and_thresholds() {
        let start = Instant::now();
        let mut dropdown = deferred();
        let current = json!(["12"]);

        let initial = dropdown.mount(Some(&current)).unwrap();
        assert_eq!(initial.include, vec!["12".to_string()]);
        assert!(initial.search.is_none());

        dropdown.set_search("he", start);
        assert!(dropdown.poll(start + Duration::from_millis(600), Some(&current)).is_none());

        dropdown.set_search("hel", start);
        dropdown.set_search("hello", start + Duration::from_millis(200));
        assert!(dropdown.poll(start + Duration::from_millis(600), Some(&current)).is_none());
        let request = dropdown.poll(start + Duration::from_millis(700), Some(&current)).unwrap();
        assert_eq!(request.search.as_deref(), Some("hello"));
        assert!(request.include.is_empty());

        dropdown.set_search("", start + Duration::from_millis(800));
        let reset = dropdown.poll(start + Duration::from_millis(1300), Some(&current)).unwrap();
        assert!(reset.search.is_none());
        assert_eq!(reset.include, vec!["12".to_string()]);
    }

    #[test]
    fn test_stale_results_are_ignored() {
        let start = Instant::now();
        let mut dropdown = deferred();
        let first = dropdown.mount(None).unwrap();
        dropdown.set_search("contact", start);
        let second = dropdown.poll(start + Duration::from_millis(500), None).unwrap();

        assert!(!dropdown.fetch_completed(first.seq, Ok(vec![SelectOption::new("1", "Old")])));
        assert!(dropdown.is_loading());
        assert!(dropdown.fetch_completed(second.seq, Ok(vec![SelectOption::new("2", "Contact")])));
        assert_eq!(dropdown.options(), vec![SelectOption::new("2", "Contact")]);
    }

    #[test]
    fn test_fetch_error_resets_to_empty() {
        let mut dropdown = deferred();
        let first = dropdown.mount(None).unwrap();
        dropdown.fetch_completed(first.seq, Ok(vec![SelectOption::new("1", "A")]));

        let second = dropdown.reload(None).unwrap();
        dropdown.fetch_completed(second.seq, Err(ControlError::Fetch("timeout".into())));
        assert!(dropdown.options().is_empty());
        assert!(!dropdown.is_loading());
    }

    #[test]
    fn test_unmount_cancels_everything() {
        let start = Instant::now();
        let mut dropdown = deferred();
        let request = dropdown.mount(None).unwrap();
        dropdown.set_search("hello", start);
        dropdown.unmount();

        assert!(dropdown.poll(start + Duration::from_secs(5), None).is_none());
        assert!(!dropdown.fetch_completed(request.seq, Ok(vec![SelectOption::new("1", "A")])));
        assert!(dropdown.options().is_empty());
    }

    #[test]
    fn test_empty_message_depends_on_term_length() {
        let host = HostData::default();
        let settings = settings();
        let ctx = ControlContext::new(&host, &settings);
        let mut dropdown = Dropdown::new("p", "options", SelectOption::from_pairs([("a", "Alpha")]), &settings)
            .searchable(true);
        dropdown.toggle_open();

        dropdown.set_search("zz", Instant::now());
        let tree = dropdown.render(None, &ctx);
        assert_eq!(tree.find_key("no-results").map(|n| n.text_content()).as_deref(), Some("typeToSearch"));

        dropdown.set_search("zzz", Instant::now());
        let tree = dropdown.render(None, &ctx);
        assert_eq!(tree.find_key("no-results").map(|n| n.text_content()).as_deref(), Some("noOptionsFound"));

        dropdown.set_search("ALP", Instant::now());
        let tree = dropdown.render(None, &ctx);
        assert!(tree.find_key("option-a").is_some());
    }

    #[test]
    fn test_actions_deserialize_from_host_events() {
        let action: DropdownAction = serde_json::from_value(json!({ "action": "pick", "value": "12" })).unwrap();
        assert_eq!(action, DropdownAction::Pick("12".to_string()));
        let action: DropdownAction = serde_json::from_value(json!({ "action": "close" })).unwrap();
        assert_eq!(action, DropdownAction::Close);
    }

    #[test]
    fn test_search_field_visibility() {
        let settings = settings();
        let few = Dropdown::new("p", "options", SelectOption::from_pairs([("a", "A")]), &settings);
        assert!(!few.show_search());

        let many: Vec<SelectOption> = (0..11).map(|i| SelectOption::new(i.to_string(), format!("Option {i}"))).collect();
        assert!(Dropdown::new("p", "options", many, &settings).show_search());
        assert!(deferred().show_search());
    }
}
