//! Image gallery property
//!
//! Stored as `{images: [{id, url, filename}], size}` with a single
//! gallery-level size, or `{useDynamicData, size}` when bound to dynamic
//! data. Values saved before galleries became objects are bare image arrays.

use super::image::size_options;
use super::{object_or_empty, str_field, MediaAsset, DEFAULT_IMAGE_SIZE};
use crate::context::ControlContext;
use crate::effect::{Effect, Effects};
use crate::error::{ControlError, ControlResult};
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum GalleryAction {
    /// Full selection from the media picker
    SetImages(Vec<MediaAsset>),
    AddImages(Vec<MediaAsset>),
    Remove(usize),
    Clear,
    SetSize(String),
    /// Move an image so it ends up at index `to`
    Move { from: usize, to: usize },
    DragStart(usize),
    /// Drop on the gap before image `gap` (`len` is after the last one)
    Drop(usize),
    DragEnd,
    SetDynamicData(String),
}

/// Gallery value as parts, accepting the legacy array shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gallery {
    pub images: Vec<Value>,
    pub size: Option<String>,
    pub dynamic_data: Option<String>,
}

impl Gallery {
    pub fn read(value: Option<&Value>, property_id: &str) -> ControlResult<Self> {
        if let Some(Value::Array(images)) = value {
            return Ok(Self {
                images: images.clone(),
                ..Self::default()
            });
        }

        let map = object_or_empty(value, property_id, "image gallery")?;
        let images = map.get("images").and_then(Value::as_array).cloned().unwrap_or_default();
        let size = Some(str_field(&map, "size").to_string()).filter(|size| !size.is_empty());
        // Older bindings stored the dynamic data tag as `{name}`
        let dynamic_data = match map.get("useDynamicData") {
            Some(Value::String(tag)) if !tag.is_empty() => Some(tag.clone()),
            Some(Value::Object(binding)) => binding
                .get("name")
                .and_then(Value::as_str)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
            _ => None,
        };

        Ok(Self {
            images,
            size,
            dynamic_data,
        })
    }

    pub fn size(&self) -> &str {
        self.size.as_deref().unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    /// Stored value with the current images, `false` once none are left
    fn with_images(&self, images: Vec<Value>) -> Value {
        if images.is_empty() {
            return Value::Bool(false);
        }
        let mut map = Map::new();
        map.insert("images".to_string(), Value::Array(images));
        map.insert("size".to_string(), Value::String(self.size().to_string()));
        Value::Object(map)
    }
}

fn image_value(media: &MediaAsset) -> Value {
    let mut image = Map::new();
    image.insert("id".to_string(), Value::from(media.id));
    image.insert("url".to_string(), Value::String(media.url.clone()));
    image.insert("filename".to_string(), Value::String(media.display_filename()));
    Value::Object(image)
}

/// Move one element so it lands at index `to`
pub fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// Final index of an item dragged from `from` and dropped on gap `gap`
///
/// Removing the source shifts every later gap one to the left.
pub fn drop_position(from: usize, gap: usize) -> usize {
    if from < gap {
        gap - 1
    } else {
        gap
    }
}

#[derive(Debug, Clone)]
pub struct GalleryControl {
    property: PropertyDefinition,
    dragged: Option<usize>,
}

impl GalleryControl {
    pub fn new(property: PropertyDefinition) -> Self {
        Self { property, dragged: None }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn dragged(&self) -> Option<usize> {
        self.dragged
    }

    fn check_index(&self, index: usize, len: usize) -> ControlResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(ControlError::OutOfRange {
                property_id: self.property.id.clone(),
                index,
                len,
            })
        }
    }

    pub fn handle(&mut self, action: GalleryAction, value: Option<&Value>) -> ControlResult<Effects> {
        let gallery = Gallery::read(value, &self.property.id)?;

        let next = match action {
            GalleryAction::SetImages(media) => gallery.with_images(media.iter().map(image_value).collect()),
            GalleryAction::AddImages(media) => {
                let mut images = gallery.images.clone();
                for asset in &media {
                    let known = images
                        .iter()
                        .any(|image| image.get("id").and_then(Value::as_u64) == Some(asset.id));
                    if !known {
                        images.push(image_value(asset));
                    }
                }
                gallery.with_images(images)
            }
            GalleryAction::Remove(index) => {
                self.check_index(index, gallery.images.len())?;
                let mut images = gallery.images.clone();
                images.remove(index);
                gallery.with_images(images)
            }
            GalleryAction::Clear => Value::Bool(false),
            GalleryAction::SetSize(size) => {
                if !gallery.has_images() {
                    return Ok(Vec::new());
                }
                let mut map = Map::new();
                map.insert("images".to_string(), Value::Array(gallery.images.clone()));
                map.insert("size".to_string(), Value::String(size));
                Value::Object(map)
            }
            GalleryAction::Move { from, to } => {
                let len = gallery.images.len();
                self.check_index(from, len)?;
                self.check_index(to, len)?;
                let mut images = gallery.images.clone();
                if !reorder(&mut images, from, to) {
                    return Ok(Vec::new());
                }
                gallery.with_images(images)
            }
            GalleryAction::DragStart(index) => {
                self.check_index(index, gallery.images.len())?;
                self.dragged = Some(index);
                return Ok(Vec::new());
            }
            GalleryAction::Drop(gap) => {
                let Some(from) = self.dragged.take() else {
                    return Ok(Vec::new());
                };
                let len = gallery.images.len();
                if gap > len {
                    return Err(ControlError::OutOfRange {
                        property_id: self.property.id.clone(),
                        index: gap,
                        len,
                    });
                }
                let to = drop_position(from, gap);
                debug!(property_id = %self.property.id, from, to, "Gallery image dropped");
                let mut images = gallery.images.clone();
                if !reorder(&mut images, from, to) {
                    return Ok(Vec::new());
                }
                gallery.with_images(images)
            }
            GalleryAction::DragEnd => {
                self.dragged = None;
                return Ok(Vec::new());
            }
            GalleryAction::SetDynamicData(tag) => {
                let mut map = Map::new();
                if !tag.is_empty() {
                    map.insert("useDynamicData".to_string(), Value::String(tag));
                    map.insert("size".to_string(), Value::String(gallery.size().to_string()));
                }
                Value::Object(map)
            }
        };

        Ok(vec![Effect::Write(next)])
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let gallery = Gallery::read(value, &self.property.id)?;
        let mut root = primitives::base_control(&self.property.id, &self.property.label, self.property.help.as_deref());
        let dynamic = gallery.dynamic_data.as_deref().unwrap_or("");

        // Dynamic data replaces the grid entirely
        if dynamic.is_empty() {
            if gallery.has_images() {
                root = root.with_child(self.render_grid(&gallery)).with_child(
                    ControlNode::element("div")
                        .with_key("gallery-actions")
                        .with_child(primitives::media_button("edit", "setImages", ctx.t("editGallery"), true))
                        .with_child(primitives::media_button("add", "addImages", ctx.t("addImages"), true))
                        .with_child(primitives::button("clear", "clear", ctx.t("clear")).with_flag("isDestructive", true)),
                );
                root = root.with_child(
                    primitives::select_input("size", ctx.t("imageSize"), gallery.size(), None, &size_options(ctx))
                        .with_attr("data-action", "setSize"),
                );
            } else {
                root = root.with_child(primitives::media_button("no-file", "setImages", ctx.t("selectImages"), true));
            }
        }

        root = root.with_child(
            primitives::text_input("dynamic-data", ctx.t("dynamicData"), dynamic, Some(ctx.t("dynamicDataTag")))
                .with_attr("data-action", "setDynamicData"),
        );
        Ok(root)
    }

    fn render_grid(&self, gallery: &Gallery) -> ControlNode {
        ControlNode::element("ul")
            .with_key("gallery-grid")
            .with_children(gallery.images.iter().enumerate().map(|(index, image)| {
                let url = image.get("url").and_then(Value::as_str).unwrap_or("");
                let filename = image.get("filename").and_then(Value::as_str).unwrap_or("");
                ControlNode::element("li")
                    .with_key(format!("image-{}", index))
                    .with_attr("draggable", "true")
                    .with_attr("data-index", index.to_string())
                    .with_flag("data-dragging", self.dragged == Some(index))
                    .with_child(ControlNode::element("img").with_attr("src", url).with_attr("alt", filename))
                    .with_child(
                        primitives::button(&format!("remove-{}", index), "remove", "×")
                            .with_attr("data-value", index.to_string()),
                    )
            }))
    }
}
