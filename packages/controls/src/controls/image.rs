use super::{object_or_empty, str_field, truthy, MediaAsset, DEFAULT_IMAGE_SIZE, IMAGE_SIZES};
use crate::context::ControlContext;
use crate::dropdown::SelectOption;
use crate::effect::{Effect, Effects};
use crate::error::ControlResult;
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const EXTERNAL_PLACEHOLDER: &str = "https://example.com/image.jpg";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum ImageAction {
    /// Asset chosen in the host media picker
    SelectMedia(MediaAsset),
    Remove,
    SetSize(String),
    SetExternalUrl(String),
}

/// Library asset as stored: `{id, url, filename, size}`
///
/// The stored size carries over, and the URL follows the size variant when
/// the asset has one.
pub fn select_media(current: &Map<String, Value>, media: &MediaAsset) -> Map<String, Value> {
    let size = current
        .get("size")
        .and_then(Value::as_str)
        .filter(|size| !size.is_empty())
        .unwrap_or(DEFAULT_IMAGE_SIZE);

    let mut next = Map::new();
    next.insert("id".to_string(), Value::from(media.id));
    next.insert("url".to_string(), Value::String(media.url_for_size(size).to_string()));
    next.insert("filename".to_string(), Value::String(media.display_filename()));
    next.insert("size".to_string(), Value::String(size.to_string()));
    next
}

/// Size changes apply to library assets only
pub fn set_size(current: &Map<String, Value>, size: &str) -> Option<Map<String, Value>> {
    if !is_library_asset(current) {
        return None;
    }
    let mut next = current.clone();
    next.insert("size".to_string(), Value::String(size.to_string()));
    Some(next)
}

/// External image as stored: `{url, external, filename}`; empty removes it
pub fn set_external_url(url: &str) -> Map<String, Value> {
    if url.is_empty() {
        return Map::new();
    }
    let filename = url.rsplit('/').next().unwrap_or("");
    let mut next = Map::new();
    next.insert("url".to_string(), Value::String(url.to_string()));
    next.insert("external".to_string(), Value::String(url.to_string()));
    next.insert("filename".to_string(), Value::String(filename.to_string()));
    next
}

fn is_library_asset(current: &Map<String, Value>) -> bool {
    truthy(current.get("id")) && !truthy(current.get("external"))
}

fn has_image(current: &Map<String, Value>) -> bool {
    truthy(current.get("url")) || truthy(current.get("id"))
}

pub(crate) fn size_options(ctx: &ControlContext<'_>) -> Vec<SelectOption> {
    IMAGE_SIZES
        .into_iter()
        .map(|(value, label_key)| SelectOption::new(value, ctx.t(label_key)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ImageControl {
    property: PropertyDefinition,
}

impl ImageControl {
    pub fn new(property: PropertyDefinition) -> Self {
        Self { property }
    }

    fn current(&self, value: Option<&Value>) -> ControlResult<Map<String, Value>> {
        object_or_empty(value, &self.property.id, "image")
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn handle(&mut self, action: ImageAction, value: Option<&Value>) -> ControlResult<Effects> {
        let current = self.current(value)?;
        let next = match action {
            ImageAction::SelectMedia(media) => Some(select_media(&current, &media)),
            ImageAction::Remove => Some(Map::new()),
            ImageAction::SetSize(size) => set_size(&current, &size),
            ImageAction::SetExternalUrl(url) => Some(set_external_url(&url)),
        };
        Ok(next
            .map(|next| Effect::Write(Value::Object(next)))
            .into_iter()
            .collect())
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let current = self.current(value)?;
        let mut root = primitives::base_control(&self.property.id, &self.property.label, self.property.help.as_deref());

        if has_image(&current) {
            let preview = ControlNode::element("div")
                .with_key("image-preview")
                .with_child(
                    ControlNode::element("img")
                        .with_key("img")
                        .with_attr("src", str_field(&current, "url"))
                        .with_attr("alt", str_field(&current, "filename")),
                )
                .with_child(
                    ControlNode::element("div")
                        .with_key("actions")
                        .with_child(primitives::media_button("upload", "selectMedia", ctx.t("replaceImage"), false))
                        .with_child(primitives::button("remove", "remove", ctx.t("remove")).with_flag("isDestructive", true)),
                );
            root = root.with_child(preview);

            if is_library_asset(&current) {
                let size = current
                    .get("size")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_IMAGE_SIZE);
                root = root.with_child(
                    primitives::select_input("size", ctx.t("imageSize"), size, None, &size_options(ctx))
                        .with_attr("data-action", "setSize"),
                );
            }
        } else {
            root = root.with_child(primitives::media_button("upload-empty", "selectMedia", ctx.t("selectImage"), false));
        }

        if !truthy(current.get("id")) {
            // `external: true` is a legacy flag, not a URL
            let external = current.get("external").and_then(Value::as_str).unwrap_or("");
            root = root.with_child(
                primitives::text_input("external-url", ctx.t("externalUrl"), external, Some(EXTERNAL_PLACEHOLDER))
                    .with_attr("data-action", "setExternalUrl"),
            );
        }

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_common::{EditorSettings, HostData};
    use blocks_schema::PropertyKind;
    use serde_json::json;

    fn control() -> ImageControl {
        ImageControl::new(PropertyDefinition::new("media", PropertyKind::Image, "Media"))
    }

    #[test]
    fn test_select_uses_size_variant() {
        let mut control = control();
        let media = MediaAsset::new(5, "https://a.test/full.png").with_size("large", "https://a.test/large.png");
        let current = json!({ "url": "https://ext.test/x.png", "external": "https://ext.test/x.png", "size": "large" });

        let effects = control.handle(ImageAction::SelectMedia(media), Some(&current)).unwrap();
        assert_eq!(
            effects,
            vec![Effect::Write(json!({
                "id": 5,
                "url": "https://a.test/large.png",
                "filename": "",
                "size": "large"
            }))]
        );
    }

    #[test]
    fn test_size_change_ignored_for_external() {
        let mut control = control();
        let external = json!({ "url": "https://e.test/a.png", "external": "https://e.test/a.png" });
        assert!(control.handle(ImageAction::SetSize("medium".into()), Some(&external)).unwrap().is_empty());

        let library = json!({ "id": 3, "url": "u", "size": "full" });
        let effects = control.handle(ImageAction::SetSize("medium".into()), Some(&library)).unwrap();
        assert_eq!(effects, vec![Effect::Write(json!({ "id": 3, "url": "u", "size": "medium" }))]);
    }

    #[test]
    fn test_external_url_replaces_library_asset() {
        assert_eq!(
            Value::Object(set_external_url("https://e.test/img/photo.jpg")),
            json!({
                "url": "https://e.test/img/photo.jpg",
                "external": "https://e.test/img/photo.jpg",
                "filename": "photo.jpg"
            })
        );
        assert!(set_external_url("").is_empty());
    }

    #[test]
    fn test_render_hides_external_field_for_library_assets() {
        let host = HostData::default();
        let settings = EditorSettings::default();
        let ctx = ControlContext::new(&host, &settings);
        let control = control();

        let tree = control.render(None, &ctx).unwrap();
        assert!(tree.find_key("upload-empty").is_some());
        assert!(tree.find_key("external-url").is_some());

        let tree = control.render(Some(&json!({ "id": 3, "url": "u" })), &ctx).unwrap();
        assert!(tree.find_key("image-preview").is_some());
        assert!(tree.find_key("size").is_some());
        assert!(tree.find_key("external-url").is_none());
    }
}
