//! Link property
//!
//! A link is keyed by `type`. Switching the type keeps only what the new
//! type can use plus the shared attributes (`newTab`, `rel`, `ariaLabel`,
//! `title`). Clearing stores `false`.

use super::{object_or_empty, set_or_remove, str_field, truthy, MediaAsset};
use crate::context::ControlContext;
use crate::dropdown::{value_text, Dropdown, DropdownAction, SelectOption};
use crate::effect::{Effect, Effects};
use crate::error::ControlResult;
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::debug;

const POST_FIELD: &str = "postId";
const TERM_FIELD: &str = "term";

/// Attributes every link type keeps across a type switch
const SHARED_FIELDS: [&str; 4] = ["newTab", "rel", "ariaLabel", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkType {
    External,
    Internal,
    Taxonomy,
    /// Dynamic data
    Meta,
    Media,
    LightboxImage,
    LightboxVideo,
}

impl LinkType {
    pub const ALL: [LinkType; 7] = [
        LinkType::Internal,
        LinkType::Taxonomy,
        LinkType::Meta,
        LinkType::External,
        LinkType::Media,
        LinkType::LightboxImage,
        LinkType::LightboxVideo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::External => "external",
            LinkType::Internal => "internal",
            LinkType::Taxonomy => "taxonomy",
            LinkType::Meta => "meta",
            LinkType::Media => "media",
            LinkType::LightboxImage => "lightboxImage",
            LinkType::LightboxVideo => "lightboxVideo",
        }
    }

    pub fn parse(tag: &str) -> Option<LinkType> {
        LinkType::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    pub fn is_lightbox(self) -> bool {
        matches!(self, LinkType::LightboxImage | LinkType::LightboxVideo)
    }

    fn label(self, ctx: &ControlContext<'_>) -> String {
        match self {
            LinkType::Internal => ctx.t("internal").to_string(),
            LinkType::Taxonomy => format!("{} ({})", ctx.t("taxonomy"), ctx.t("term")),
            LinkType::Meta => ctx.t("dynamicData").to_string(),
            LinkType::External => ctx.t("customURL").to_string(),
            LinkType::Media => ctx.t("media").to_string(),
            LinkType::LightboxImage => ctx.t("lightboxImage").to_string(),
            LinkType::LightboxVideo => ctx.t("lightboxVideo").to_string(),
        }
    }
}

/// Free-text link attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkField {
    Rel,
    AriaLabel,
    Title,
    UseDynamicData,
    UrlParams,
    LightboxVideo,
    LightboxAnimationType,
    LightboxId,
}

impl LinkField {
    pub fn key(self) -> &'static str {
        match self {
            LinkField::Rel => "rel",
            LinkField::AriaLabel => "ariaLabel",
            LinkField::Title => "title",
            LinkField::UseDynamicData => "useDynamicData",
            LinkField::UrlParams => "urlParams",
            LinkField::LightboxVideo => "lightboxVideo",
            LinkField::LightboxAnimationType => "lightboxAnimationType",
            LinkField::LightboxId => "lightboxId",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum LinkAction {
    /// Empty clears the link
    SetType(String),
    SetUrl(String),
    PostPicker(DropdownAction),
    SetTaxonomy(String),
    TermPicker(DropdownAction),
    SetNewTab(bool),
    SetField { field: LinkField, value: String },
    SetLightboxImage(Option<MediaAsset>),
    SetLightboxVideoNoControls(bool),
    Clear,
}

/// Value after switching the link type; `None` clears the link
pub fn switch_type(current: &Map<String, Value>, kind: Option<LinkType>) -> Value {
    let Some(kind) = kind else {
        return Value::Bool(false);
    };

    let mut next = Map::new();
    next.insert("type".to_string(), Value::String(kind.as_str().to_string()));

    let kept = match kind {
        LinkType::External => Some("url"),
        LinkType::Internal => Some(POST_FIELD),
        _ => None,
    };
    for key in kept.into_iter().chain(SHARED_FIELDS) {
        if let Some(value) = current.get(key).filter(|value| truthy(Some(*value))) {
            next.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(next)
}

/// A custom URL replaces any selected post
pub fn set_url(current: &Map<String, Value>, url: &str) -> Map<String, Value> {
    let mut next = current.clone();
    set_or_remove(&mut next, "url", Value::String(url.to_string()));
    next.remove(POST_FIELD);
    next
}

/// A selected post replaces any custom URL
pub fn set_post_id(current: &Map<String, Value>, post_id: &str) -> Map<String, Value> {
    let mut next = current.clone();
    set_or_remove(&mut next, POST_FIELD, Value::String(post_id.to_string()));
    next.remove("url");
    next
}

/// A new taxonomy invalidates the chosen term
pub fn set_taxonomy(current: &Map<String, Value>, taxonomy: &str) -> Map<String, Value> {
    let mut next = current.clone();
    set_or_remove(&mut next, "taxonomy", Value::String(taxonomy.to_string()));
    next.remove(TERM_FIELD);
    next
}

fn post_descriptor() -> Map<String, Value> {
    let mut descriptor = Map::new();
    descriptor.insert("action".to_string(), Value::from("bricks_get_posts"));
    descriptor.insert("postType".to_string(), Value::from("any"));
    descriptor.insert("addLanguageToPostTitle".to_string(), Value::from("true"));
    descriptor
}

fn term_descriptor(taxonomy: &str) -> Option<Map<String, Value>> {
    if taxonomy.is_empty() {
        return None;
    }
    let mut descriptor = Map::new();
    descriptor.insert("action".to_string(), Value::from("bricks_get_terms_options"));
    descriptor.insert("taxonomy".to_string(), Value::from(taxonomy));
    Some(descriptor)
}

fn link_type(current: &Map<String, Value>) -> Option<LinkType> {
    LinkType::parse(str_field(current, "type"))
}

#[derive(Debug, Clone)]
pub struct LinkControl {
    property: PropertyDefinition,
    post_picker: Dropdown,
    term_picker: Dropdown,
}

impl LinkControl {
    pub fn new(property: PropertyDefinition, ctx: &ControlContext<'_>) -> Self {
        let post_label = ctx.i18n().get_any(&["selectPost", "post"]);
        let post_picker = Dropdown::new(property.id.clone(), POST_FIELD, Vec::new(), ctx.settings)
            .with_label(post_label)
            .with_placeholder(post_label)
            .deferred(post_descriptor());
        let term_picker = Dropdown::new(property.id.clone(), TERM_FIELD, Vec::new(), ctx.settings)
            .with_label(ctx.t("term"))
            .with_placeholder(ctx.t("selectTerm"));

        Self {
            property,
            post_picker,
            term_picker,
        }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn post_picker(&self) -> &Dropdown {
        &self.post_picker
    }

    pub fn term_picker(&self) -> &Dropdown {
        &self.term_picker
    }

    fn current(&self, value: Option<&Value>) -> ControlResult<Map<String, Value>> {
        object_or_empty(value, &self.property.id, "link")
    }

    /// Link types offered, after exclusions and the lightbox switch
    pub fn link_types(&self) -> Vec<LinkType> {
        LinkType::ALL
            .into_iter()
            .filter(|kind| !self.is_excluded(kind.as_str()))
            .filter(|kind| self.property.popup != Some(false) || !kind.is_lightbox())
            .collect()
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.property.exclude.iter().any(|excluded| excluded == name)
    }

    /// Initial fetches for the pickers the current type shows
    pub fn mount(&mut self, value: Option<&Value>) -> ControlResult<Effects> {
        let current = self.current(value)?;
        let mut effects = Vec::new();
        match link_type(&current) {
            Some(LinkType::Internal) => {
                effects.extend(self.post_picker.mount(current.get(POST_FIELD)).map(Effect::Fetch));
            }
            Some(LinkType::Taxonomy) => {
                self.term_picker
                    .set_descriptor(term_descriptor(str_field(&current, "taxonomy")));
                effects.extend(self.term_picker.mount(current.get(TERM_FIELD)).map(Effect::Fetch));
            }
            _ => {}
        }
        Ok(effects)
    }

    pub fn handle(&mut self, action: LinkAction, value: Option<&Value>, now: Instant) -> ControlResult<Effects> {
        let current = self.current(value)?;
        let mut effects = Vec::new();

        let next = match action {
            LinkAction::SetType(tag) => {
                let kind = LinkType::parse(&tag);
                let next = switch_type(&current, kind);
                if kind == Some(LinkType::Internal) {
                    effects.extend(self.post_picker.mount(next.get(POST_FIELD)).map(Effect::Fetch));
                }
                Some(next)
            }
            LinkAction::SetUrl(url) => Some(Value::Object(set_url(&current, &url))),
            LinkAction::PostPicker(action) => self
                .post_picker
                .apply(action, current.get(POST_FIELD), now)
                .map(|picked| Value::Object(set_post_id(&current, &value_text(&picked)))),
            LinkAction::SetTaxonomy(taxonomy) => {
                debug!(property_id = %self.property.id, taxonomy = %taxonomy, "Link taxonomy changed");
                self.term_picker.set_descriptor(term_descriptor(&taxonomy));
                effects.extend(self.term_picker.reload(None).map(Effect::Fetch));
                Some(Value::Object(set_taxonomy(&current, &taxonomy)))
            }
            LinkAction::TermPicker(action) => self.term_picker.apply(action, current.get(TERM_FIELD), now).map(|picked| {
                let mut next = current.clone();
                set_or_remove(&mut next, TERM_FIELD, picked);
                Value::Object(next)
            }),
            LinkAction::SetNewTab(on) => {
                let mut next = current.clone();
                set_or_remove(&mut next, "newTab", Value::Bool(on));
                Some(Value::Object(next))
            }
            LinkAction::SetField { field, value } => {
                let mut next = current.clone();
                set_or_remove(&mut next, field.key(), Value::String(value));
                Some(Value::Object(next))
            }
            LinkAction::SetLightboxImage(media) => {
                let mut next = current.clone();
                let image = media.map(|media| {
                    let mut image = Map::new();
                    image.insert("id".to_string(), Value::from(media.id));
                    image.insert("url".to_string(), Value::String(media.url.clone()));
                    image.insert("filename".to_string(), Value::String(media.display_filename()));
                    Value::Object(image)
                });
                set_or_remove(&mut next, "lightboxImage", image.unwrap_or(Value::Null));
                Some(Value::Object(next))
            }
            LinkAction::SetLightboxVideoNoControls(on) => {
                let mut next = current.clone();
                set_or_remove(&mut next, "lightboxVideoNoControls", Value::Bool(on));
                Some(Value::Object(next))
            }
            LinkAction::Clear => Some(Value::Bool(false)),
        };

        if let Some(next) = next {
            effects.insert(0, Effect::Write(next));
        }
        Ok(effects)
    }

    pub fn poll(&mut self, now: Instant, value: Option<&Value>) -> Effects {
        let current = value.and_then(Value::as_object);
        let post = current.and_then(|map| map.get(POST_FIELD));
        let term = current.and_then(|map| map.get(TERM_FIELD));
        self.post_picker
            .poll(now, post)
            .into_iter()
            .chain(self.term_picker.poll(now, term))
            .map(Effect::Fetch)
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.post_picker.next_deadline(), self.term_picker.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn fetch_completed(&mut self, field: &str, seq: u64, result: ControlResult<Vec<SelectOption>>) -> bool {
        match field {
            POST_FIELD => self.post_picker.fetch_completed(seq, result),
            TERM_FIELD => self.term_picker.fetch_completed(seq, result),
            _ => false,
        }
    }

    pub fn unmount(&mut self) {
        self.post_picker.unmount();
        self.term_picker.unmount();
    }

    /// One-line description for the link preview
    pub fn summary(&self, current: &Map<String, Value>, ctx: &ControlContext<'_>) -> String {
        match link_type(current) {
            Some(LinkType::External) | Some(LinkType::Media) => str_field(current, "url").to_string(),
            Some(LinkType::Internal) => {
                let post_id = current.get(POST_FIELD).map(value_text).unwrap_or_default();
                let label = self.post_picker.label_for(&post_id).unwrap_or(post_id);
                format!("{}: {}", ctx.t("post"), label)
            }
            _ => ctx.t("linkConfigured").to_string(),
        }
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let current = self.current(value)?;
        let kind = link_type(&current);
        let type_options: Vec<SelectOption> = self
            .link_types()
            .into_iter()
            .map(|kind| SelectOption::new(kind.as_str(), kind.label(ctx)))
            .collect();

        let mut root = primitives::base_control(&self.property.id, &self.property.label, self.property.help.as_deref())
            .with_child(
                primitives::select_input(
                    "type",
                    ctx.t("linkType"),
                    kind.map(LinkType::as_str).unwrap_or(""),
                    Some(ctx.t("selectLinkType")),
                    &type_options,
                )
                .with_attr("data-action", "setType"),
            );

        let Some(kind) = kind else {
            return Ok(root);
        };

        root = root.with_children(self.render_type_fields(kind, &current, ctx));
        root = root.with_children(self.render_shared_fields(&current, ctx));
        root = root.with_child(
            ControlNode::element("div")
                .with_key("link-preview")
                .with_child(
                    ControlNode::element("span")
                        .with_key("preview")
                        .with_child(ControlNode::text(self.summary(&current, ctx))),
                )
                .with_child(primitives::button("clear", "clear", ctx.t("clear"))),
        );
        Ok(root)
    }

    fn render_type_fields(&self, kind: LinkType, current: &Map<String, Value>, ctx: &ControlContext<'_>) -> Vec<ControlNode> {
        let mut fields = Vec::new();
        match kind {
            LinkType::External => {
                fields.push(
                    primitives::text_input("url", ctx.t("url"), str_field(current, "url"), Some(ctx.t("httpsExampleCom")))
                        .with_attr("data-action", "setUrl"),
                );
            }
            LinkType::Media => {
                fields.push(
                    primitives::text_input(
                        "url",
                        ctx.t("mediaUrl"),
                        str_field(current, "url"),
                        Some(ctx.t("httpsExampleComFile")),
                    )
                    .with_attr("help", ctx.t("enterUrlOfMedia"))
                    .with_attr("data-action", "setUrl"),
                );
            }
            LinkType::Internal => {
                fields.push(self.post_picker.render(current.get(POST_FIELD), ctx));
                if truthy(current.get(POST_FIELD)) && !self.is_excluded("urlParams") {
                    fields.push(self.text_field(LinkField::UrlParams, "urlParameters", current, ctx));
                }
            }
            LinkType::Taxonomy => {
                let taxonomies: Vec<SelectOption> = ctx
                    .host
                    .taxonomy_options()
                    .into_iter()
                    .map(|(value, label)| SelectOption::new(value, label))
                    .collect();
                let taxonomy = str_field(current, "taxonomy");
                fields.push(
                    primitives::select_input(
                        "taxonomy",
                        ctx.t("taxonomy"),
                        taxonomy,
                        Some(ctx.t("selectTaxonomy")),
                        &taxonomies,
                    )
                    .with_attr("data-action", "setTaxonomy"),
                );
                if !taxonomy.is_empty() {
                    fields.push(self.term_picker.render(current.get(TERM_FIELD), ctx));
                }
            }
            LinkType::Meta => {
                fields.push(
                    self.text_field(LinkField::UseDynamicData, "dynamicData", current, ctx)
                        .with_attr("help", ctx.t("dynamicDataDescription")),
                );
            }
            LinkType::LightboxImage => {
                fields.push(primitives::notice("lightbox-info", "info", ctx.t("infoLightbox")));
                let image_url = current
                    .get("lightboxImage")
                    .and_then(|image| image.get("url"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let mut container = ControlNode::element("div").with_key("lightbox-image-container");
                if image_url.is_empty() {
                    container = container.with_child(primitives::media_button(
                        "select-button",
                        "setLightboxImage",
                        ctx.t("selectImage"),
                        false,
                    ));
                } else {
                    container = container
                        .with_child(ControlNode::element("img").with_key("preview").with_attr("src", image_url))
                        .with_child(primitives::media_button(
                            "select-button",
                            "setLightboxImage",
                            ctx.t("changeImage"),
                            false,
                        ))
                        .with_child(primitives::button("remove-button", "setLightboxImage", ctx.t("removeImage")));
                }
                fields.push(container);

                let mut animations = vec![SelectOption::new("", ctx.t("zoom"))];
                animations.extend(
                    ctx.host
                        .lightbox_animation_types
                        .iter()
                        .map(|(value, label)| SelectOption::new(value.clone(), label.clone())),
                );
                fields.push(
                    primitives::select_input(
                        LinkField::LightboxAnimationType.key(),
                        ctx.t("lightboxAnimation"),
                        str_field(current, "lightboxAnimationType"),
                        None,
                        &animations,
                    )
                    .with_attr("data-action", "setField"),
                );
                fields.push(self.text_field(LinkField::LightboxId, "lightboxId", current, ctx));
            }
            LinkType::LightboxVideo => {
                fields.push(primitives::notice("lightbox-video-info", "info", ctx.t("infoLightbox")));
                fields.push(
                    self.text_field(LinkField::LightboxVideo, "videoUrl", current, ctx)
                        .with_attr("help", ctx.t("descriptionLightboxVideo")),
                );
                fields.push(
                    primitives::checkbox(
                        "lightboxVideoNoControls",
                        &format!("{}: {}", ctx.t("disable"), ctx.t("controls")),
                        truthy(current.get("lightboxVideoNoControls")),
                    )
                    .with_attr("data-action", "setLightboxVideoNoControls"),
                );
            }
        }
        fields
    }

    fn render_shared_fields(&self, current: &Map<String, Value>, ctx: &ControlContext<'_>) -> Vec<ControlNode> {
        let mut fields = Vec::new();
        if !self.is_excluded("newTab") {
            fields.push(
                primitives::checkbox("newTab", ctx.t("openInNewTab"), truthy(current.get("newTab")))
                    .with_attr("data-action", "setNewTab"),
            );
        }
        for (field, label_key) in [
            (LinkField::Rel, "rel"),
            (LinkField::AriaLabel, "ariaLabel"),
            (LinkField::Title, "title"),
        ] {
            if !self.is_excluded(field.key()) {
                fields.push(self.text_field(field, label_key, current, ctx));
            }
        }
        fields
    }

    fn text_field(&self, field: LinkField, label_key: &'static str, current: &Map<String, Value>, ctx: &ControlContext<'_>) -> ControlNode {
        primitives::text_input(field.key(), ctx.t(label_key), str_field(current, field.key()), None)
            .with_attr("data-action", "setField")
    }
}
