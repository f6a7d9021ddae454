//! Icon property
//!
//! Stored shape: `{library, icon?, svg?, dynamicData?, height?, width?,
//! strokeWidth?, stroke?, fill?}`. The library decides which of the other
//! fields are meaningful; switching to a font or custom set drops the rest.

use super::{object_or_empty, set_or_remove, str_field};
use crate::context::ControlContext;
use crate::dropdown::SelectOption;
use crate::effect::{Effect, Effects};
use crate::error::ControlResult;
use crate::node::ControlNode;
use crate::primitives;
use blocks_common::HostData;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LIBRARY_SVG: &str = "svg";
pub const LIBRARY_DYNAMIC_DATA: &str = "dynamicData";
const CUSTOM_PREFIX: &str = "custom_";

/// Built-in font libraries with their i18n label keys
const FONT_LIBRARIES: [(&str, &str); 5] = [
    ("fontawesomeBrands", "fontAwesomeBrands"),
    ("fontawesomeRegular", "fontAwesomeRegular"),
    ("fontawesomeSolid", "fontAwesomeSolid"),
    ("ionicons", "ionicons"),
    ("themify", "themify"),
];

/// Top-level styling fields of an SVG icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SvgStyle {
    Height,
    Width,
    StrokeWidth,
    Stroke,
    Fill,
}

impl SvgStyle {
    pub const ALL: [SvgStyle; 5] = [
        SvgStyle::Height,
        SvgStyle::Width,
        SvgStyle::StrokeWidth,
        SvgStyle::Stroke,
        SvgStyle::Fill,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SvgStyle::Height => "height",
            SvgStyle::Width => "width",
            SvgStyle::StrokeWidth => "strokeWidth",
            SvgStyle::Stroke => "stroke",
            SvgStyle::Fill => "fill",
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            SvgStyle::Stroke => "strokeColor",
            other => other.key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum IconAction {
    SetLibrary(String),
    OpenPicker,
    ClosePicker,
    Search(String),
    SelectIcon(String),
    SetSvgUrl(String),
    SetStyle { field: SvgStyle, value: String },
    SetDynamicData(String),
    Clear,
}

/// Entry of the icon grid
#[derive(Debug, Clone, PartialEq)]
pub struct IconChoice {
    pub key: String,
    pub title: String,
    /// Custom set icons render as images, font icons by class name
    pub image_url: Option<String>,
}

fn custom_set_id(library: &str) -> Option<&str> {
    library.strip_prefix(CUSTOM_PREFIX)
}

fn is_source_library(library: &str) -> bool {
    library == LIBRARY_SVG || library == LIBRARY_DYNAMIC_DATA
}

/// Value after choosing a library
///
/// An empty library clears the icon. Font and custom sets discard any icon,
/// SVG or dynamic data picked under the previous library.
pub fn set_library(current: &Map<String, Value>, library: &str) -> Map<String, Value> {
    if library.is_empty() {
        return Map::new();
    }
    let mut next = current.clone();
    next.insert("library".to_string(), Value::String(library.to_string()));
    if !is_source_library(library) {
        next.remove("svg");
        next.remove("dynamicData");
        next.remove("icon");
    }
    next
}

/// Value after picking an icon from the grid
///
/// Custom sets store the uploaded SVG reference; font sets store the class.
pub fn select_icon(current: &Map<String, Value>, icon_key: &str, host: &HostData) -> Map<String, Value> {
    let mut next = current.clone();
    let library = str_field(current, "library");

    if custom_set_id(library).is_some() {
        if let Some(icon) = host.custom_icon(icon_key) {
            let mut svg = Map::new();
            svg.insert("id".to_string(), icon.attachment_id.clone().unwrap_or(Value::Null));
            svg.insert("icon_id".to_string(), Value::String(icon.id.clone()));
            svg.insert("url".to_string(), Value::String(icon.url.clone()));
            next.insert("svg".to_string(), Value::Object(svg));
            next.remove("icon");
        }
    } else {
        next.insert("icon".to_string(), Value::String(icon_key.to_string()));
        next.remove("svg");
    }
    next
}

pub fn set_svg_url(current: &Map<String, Value>, url: &str) -> Map<String, Value> {
    let mut next = current.clone();
    let mut svg = next.get("svg").and_then(Value::as_object).cloned().unwrap_or_default();
    svg.insert("url".to_string(), Value::String(url.to_string()));
    next.insert("svg".to_string(), Value::Object(svg));
    next
}

/// Library options: built-in fonts, non-empty custom sets, then sources
///
/// Disabled sets stay listed while they are the current library.
pub fn available_libraries(
    property: &PropertyDefinition,
    current_library: &str,
    ctx: &ControlContext<'_>,
) -> Vec<SelectOption> {
    let host = ctx.host;
    let disabled = |key: &str| host.disabled_icon_sets.iter().any(|set| set == key);
    let custom_only = property.libraries.as_deref() == Some("custom");
    let mut libraries = Vec::new();

    if !custom_only {
        for (key, label_key) in FONT_LIBRARIES {
            if !disabled(key) || key == current_library {
                libraries.push(SelectOption::new(key, ctx.t(label_key)));
            }
        }
    }

    for set in &host.icon_sets {
        let key = format!("{}{}", CUSTOM_PREFIX, set.id);
        let is_current = key == current_library;
        if disabled(&set.id) && !is_current {
            continue;
        }
        if is_current || host.custom_icons_in_set(&set.id).next().is_some() {
            libraries.push(SelectOption::new(key, set.name.clone()));
        }
    }

    if !custom_only {
        libraries.push(SelectOption::new(LIBRARY_SVG, "SVG"));
        libraries.push(SelectOption::new(LIBRARY_DYNAMIC_DATA, ctx.t("dynamicData")));
    }

    libraries
}

/// Icons of a library; no library shows ionicons
pub fn icon_choices(library: &str, host: &HostData) -> Vec<IconChoice> {
    if let Some(set_id) = custom_set_id(library) {
        return host
            .custom_icons_in_set(set_id)
            .map(|icon| IconChoice {
                key: icon.id.clone(),
                title: icon.name.clone(),
                image_url: Some(icon.url.clone()),
            })
            .collect();
    }

    let library = if library.is_empty() { "ionicons" } else { library };
    let fonts = &host.icon_fonts;
    let (names, prefix) = match library {
        "fontawesomeBrands" => (&fonts.fontawesome_brands, "fab"),
        "fontawesomeRegular" => (&fonts.fontawesome_regular, "far"),
        "fontawesomeSolid" => (&fonts.fontawesome_solid, "fas"),
        "ionicons" => (&fonts.ionicons, ""),
        "themify" => (&fonts.themify, ""),
        _ => return Vec::new(),
    };

    names
        .iter()
        .map(|name| {
            let key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{} {}", prefix, name)
            };
            IconChoice {
                title: key.clone(),
                key,
                image_url: None,
            }
        })
        .collect()
}

/// Case-insensitive title filter
pub fn filter_icons(choices: Vec<IconChoice>, term: &str) -> Vec<IconChoice> {
    if term.is_empty() {
        return choices;
    }
    let needle = term.to_lowercase();
    choices
        .into_iter()
        .filter(|choice| choice.title.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone)]
pub struct IconControl {
    property: PropertyDefinition,
    picker_open: bool,
    search_term: String,
}

impl IconControl {
    pub fn new(property: PropertyDefinition) -> Self {
        Self {
            property,
            picker_open: false,
            search_term: String::new(),
        }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker_open
    }

    fn current(&self, value: Option<&Value>) -> ControlResult<Map<String, Value>> {
        object_or_empty(value, &self.property.id, "icon")
    }

    pub fn handle(&mut self, action: IconAction, value: Option<&Value>, host: &HostData) -> ControlResult<Effects> {
        let current = self.current(value)?;
        let next = match action {
            IconAction::OpenPicker => {
                self.picker_open = true;
                return Ok(Vec::new());
            }
            IconAction::ClosePicker => {
                self.picker_open = false;
                return Ok(Vec::new());
            }
            IconAction::Search(term) => {
                self.search_term = term;
                return Ok(Vec::new());
            }
            IconAction::SetLibrary(library) => {
                self.search_term.clear();
                set_library(&current, &library)
            }
            IconAction::SelectIcon(key) => {
                self.picker_open = false;
                select_icon(&current, &key, host)
            }
            IconAction::SetSvgUrl(url) => set_svg_url(&current, &url),
            IconAction::SetStyle { field, value } => {
                let mut next = current;
                set_or_remove(&mut next, field.key(), Value::String(value));
                next
            }
            IconAction::SetDynamicData(tag) => {
                let mut next = current;
                next.insert("dynamicData".to_string(), Value::String(tag));
                next
            }
            IconAction::Clear => {
                self.picker_open = false;
                Map::new()
            }
        };
        Ok(vec![Effect::Write(Value::Object(next))])
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let current = self.current(value)?;
        let library = str_field(&current, "library");
        let help = self
            .property
            .help
            .clone()
            .unwrap_or_else(|| ctx.t("selectAnIconLibrary").to_string());

        let mut root = primitives::base_control(&self.property.id, &self.property.label, Some(help.as_str()))
            .with_child(self.render_preview(&current, ctx.host));

        if self.picker_open {
            root = root.with_child(self.render_picker(&current, library, ctx));
        }
        Ok(root)
    }

    fn render_preview(&self, current: &Map<String, Value>, host: &HostData) -> ControlNode {
        let library = str_field(current, "library");
        let svg_url = current
            .get("svg")
            .and_then(|svg| svg.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty());
        let icon = str_field(current, "icon");
        let dynamic = str_field(current, "dynamicData");

        let preview = if let Some(url) = svg_url {
            Some(ControlNode::element("img").with_attr("src", url).with_attr("alt", ""))
        } else if library == LIBRARY_DYNAMIC_DATA && !dynamic.is_empty() {
            Some(ControlNode::markup(dynamic))
        } else if !icon.is_empty() {
            Some(ControlNode::element("i").with_attr("class", icon))
        } else {
            None
        };

        let mut button = ControlNode::element("Button")
            .with_key("preview-button")
            .with_attr("data-action", "openPicker")
            .with_flag("data-empty", preview.is_none())
            .with_child(preview.unwrap_or_else(|| ControlNode::text("+")));

        let background = custom_set_id(library)
            .and_then(|set_id| host.icon_set(set_id))
            .and_then(|set| set.background_color.clone());
        if let Some(color) = background {
            button = button.with_style("background-color", color);
        }
        button
    }

    fn render_picker(&self, current: &Map<String, Value>, library: &str, ctx: &ControlContext<'_>) -> ControlNode {
        let libraries = available_libraries(&self.property, library, ctx);
        let placeholder = ctx.i18n().get_any(&["selectIconSet", "selectIconLibrary"]);

        let mut modal = ControlNode::element("Modal")
            .with_key("icon-modal")
            .with_attr("title", ctx.t("selectIcon"))
            .with_attr("data-dismiss", "closePicker")
            .with_child(
                primitives::select_input("library", ctx.t("source"), library, Some(placeholder), &libraries)
                    .with_attr("data-action", "setLibrary"),
            );

        if library == LIBRARY_DYNAMIC_DATA {
            modal = modal.with_child(
                primitives::text_input(
                    "dynamicData",
                    ctx.t("dynamicData"),
                    str_field(current, "dynamicData"),
                    Some(ctx.t("dynamicDataTag")),
                )
                .with_attr("data-action", "setDynamicData"),
            );
        } else if library == LIBRARY_SVG {
            let svg_url = current
                .get("svg")
                .and_then(|svg| svg.get("url"))
                .and_then(Value::as_str)
                .unwrap_or("");
            let mut wrapper = ControlNode::element("div").with_key("svg-wrapper").with_child(
                primitives::text_input("svg-url", ctx.t("svgUrl"), svg_url, None).with_attr("data-action", "setSvgUrl"),
            );
            for style in SvgStyle::ALL {
                wrapper = wrapper.with_child(
                    primitives::text_input(style.key(), ctx.t(style.label_key()), str_field(current, style.key()), None)
                        .with_attr("data-action", "setStyle"),
                );
            }
            modal = modal.with_child(wrapper);
        } else if !library.is_empty() {
            modal = modal.with_child(self.render_grid(current, library, ctx));
        }

        modal.with_child(primitives::button("clear-icon", "clear", ctx.t("clear")))
    }

    fn render_grid(&self, current: &Map<String, Value>, library: &str, ctx: &ControlContext<'_>) -> ControlNode {
        let selected_icon = str_field(current, "icon");
        let selected_svg = current
            .get("svg")
            .and_then(|svg| svg.get("icon_id"))
            .and_then(Value::as_str)
            .unwrap_or("");

        let search = primitives::text_input("search", ctx.t("searchFor"), &self.search_term, Some(ctx.t("searchFor")))
            .with_attr("data-action", "search");
        let choices = filter_icons(icon_choices(library, ctx.host), &self.search_term);

        let list = if choices.is_empty() {
            ControlNode::element("div")
                .with_key("no-icons")
                .with_child(ControlNode::text(ctx.t("nothingFound")))
        } else {
            ControlNode::element("ul").with_key("icons-list").with_children(choices.into_iter().map(|choice| {
                let active = choice.key == selected_icon || (!selected_svg.is_empty() && choice.key == selected_svg);
                let glyph = match &choice.image_url {
                    Some(url) => ControlNode::element("img").with_attr("src", url.clone()).with_attr("title", choice.title.clone()),
                    None => ControlNode::element("i").with_attr("class", choice.key.clone()),
                };
                ControlNode::element("li")
                    .with_key(choice.key.clone())
                    .with_attr("data-action", "selectIcon")
                    .with_attr("data-value", choice.key)
                    .with_attr("title", choice.title)
                    .with_flag("data-active", active)
                    .with_child(glyph)
            }))
        };

        ControlNode::element("div").with_key("icons-wrapper").with_child(search).with_child(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_common::{CustomIcon, EditorSettings, IconFonts, IconSet};
    use blocks_schema::PropertyKind;
    use serde_json::json;

    fn host() -> HostData {
        HostData {
            icon_fonts: IconFonts {
                fontawesome_solid: vec!["fa-house".into(), "fa-star".into()],
                ionicons: vec!["ion-ios-home".into()],
                ..IconFonts::default()
            },
            icon_sets: vec![
                IconSet { id: "s1".into(), name: "Brand".into(), background_color: Some("#000".into()) },
                IconSet { id: "s2".into(), name: "Empty".into(), background_color: None },
            ],
            custom_icons: vec![CustomIcon {
                id: "icon_1".into(),
                set_id: "s1".into(),
                name: "Logo".into(),
                url: "https://a.test/logo.svg".into(),
                attachment_id: Some(json!(77)),
            }],
            disabled_icon_sets: vec!["themify".into()],
            ..HostData::default()
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_font_library_switch_prunes_icon_fields() {
        let current = object(json!({ "library": "svg", "svg": { "url": "x.svg" }, "height": "20px" }));
        let next = set_library(&current, "fontawesomeSolid");
        assert_eq!(Value::Object(next), json!({ "library": "fontawesomeSolid", "height": "20px" }));
    }

    #[test]
    fn test_switch_into_svg_keeps_fields() {
        let current = object(json!({ "library": "ionicons", "icon": "ion-ios-home" }));
        let next = set_library(&current, "svg");
        assert_eq!(Value::Object(next), json!({ "library": "svg", "icon": "ion-ios-home" }));
        assert!(set_library(&current, "").is_empty());
    }

    #[test]
    fn test_custom_set_stores_svg_reference() {
        let current = object(json!({ "library": "custom_s1", "icon": "old" }));
        let next = select_icon(&current, "icon_1", &host());
        assert_eq!(
            Value::Object(next),
            json!({
                "library": "custom_s1",
                "svg": { "id": 77, "icon_id": "icon_1", "url": "https://a.test/logo.svg" }
            })
        );

        let font = object(json!({ "library": "fontawesomeSolid", "svg": { "url": "x" } }));
        let next = select_icon(&font, "fas fa-star", &host());
        assert_eq!(Value::Object(next), json!({ "library": "fontawesomeSolid", "icon": "fas fa-star" }));
    }

    #[test]
    fn test_library_list_respects_disabled_and_empty_sets() {
        let host = host();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let property = PropertyDefinition::new("icon", PropertyKind::Icon, "Icon");

        let keys: Vec<String> = available_libraries(&property, "", &ctx).into_iter().map(|o| o.value).collect();
        assert_eq!(
            keys,
            vec!["fontawesomeBrands", "fontawesomeRegular", "fontawesomeSolid", "ionicons", "custom_s1", "svg", "dynamicData"]
        );

        let keys: Vec<String> = available_libraries(&property, "themify", &ctx).into_iter().map(|o| o.value).collect();
        assert!(keys.contains(&"themify".to_string()));

        let custom = PropertyDefinition { libraries: Some("custom".into()), ..property };
        let keys: Vec<String> = available_libraries(&custom, "", &ctx).into_iter().map(|o| o.value).collect();
        assert_eq!(keys, vec!["custom_s1"]);
    }

    #[test]
    fn test_icon_search_filters_by_title() {
        let choices = icon_choices("fontawesomeSolid", &host());
        assert_eq!(choices[0].key, "fas fa-house");
        let filtered = filter_icons(choices, "STAR");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].key, "fas fa-star");
        assert_eq!(icon_choices("", &host())[0].key, "ion-ios-home");
    }

    #[test]
    fn test_picker_flow() {
        let host = host();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let mut control = IconControl::new(PropertyDefinition::new("icon", PropertyKind::Icon, "Icon"));
        let value = json!({ "library": "fontawesomeSolid" });

        control.handle(IconAction::OpenPicker, Some(&value), &host).unwrap();
        let tree = control.render(Some(&value), &ctx).unwrap();
        assert!(tree.find_key("icons-list").is_some());
        assert!(tree.find_key("fas fa-star").is_some());

        let effects = control.handle(IconAction::SelectIcon("fas fa-star".into()), Some(&value), &host).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!({ "library": "fontawesomeSolid", "icon": "fas fa-star" }))]);
        assert!(!control.is_picker_open());

        let effects = control.handle(IconAction::Clear, Some(&value), &host).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!({}))]);
    }

    #[test]
    fn test_svg_style_fields_clear_when_emptied() {
        let host = host();
        let mut control = IconControl::new(PropertyDefinition::new("icon", PropertyKind::Icon, "Icon"));
        let value = json!({ "library": "svg", "fill": "#fff" });
        let effects = control
            .handle(IconAction::SetStyle { field: SvgStyle::Fill, value: String::new() }, Some(&value), &host)
            .unwrap();
        assert_eq!(effects, vec![Effect::Write(json!({ "library": "svg" }))]);
    }

    #[test]
    fn test_non_object_value_is_reported() {
        let host = host();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let control = IconControl::new(PropertyDefinition::new("icon", PropertyKind::Icon, "Icon"));
        assert!(control.render(Some(&json!([1])), &ctx).is_err());
    }
}
