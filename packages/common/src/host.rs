//! # Host Snapshot
//!
//! Read-only data supplied by the host page at load time: localized strings,
//! component schemas, enabled component ids and the catalogs that option
//! lists are built from.
//!
//! Every field is optional on the wire. A missing key, or a key whose value
//! has the wrong shape, degrades to the empty default for that field instead
//! of failing the whole snapshot.

use crate::result::CommonResult;
use crate::i18n::I18n;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Process-wide snapshot of host data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostData {
    #[serde(default, deserialize_with = "lenient")]
    pub i18n: I18n,

    /// Raw component definitions. Parsed one at a time so a malformed
    /// component does not take the others down with it.
    #[serde(default, deserialize_with = "lenient")]
    pub components: Vec<Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub enabled_component_ids: Vec<String>,

    #[serde(default, alias = "globalClassesNamesIds", deserialize_with = "lenient")]
    pub global_classes: Vec<GlobalClass>,

    #[serde(default, deserialize_with = "lenient")]
    pub icon_fonts: IconFonts,

    #[serde(default, deserialize_with = "lenient")]
    pub icon_sets: Vec<IconSet>,

    #[serde(default, deserialize_with = "lenient")]
    pub custom_icons: Vec<CustomIcon>,

    #[serde(default, deserialize_with = "lenient")]
    pub disabled_icon_sets: Vec<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub taxonomies: BTreeMap<String, TaxonomyInfo>,

    #[serde(default, deserialize_with = "lenient")]
    pub post_types: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "lenient")]
    pub user_roles: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "lenient")]
    pub section_templates: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "lenient")]
    pub lightbox_animation_types: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ajax_url: Option<String>,
}

/// Named global CSS class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalClass {
    pub id: String,
    pub name: String,
}

/// Built-in icon font catalogs (class names without the family prefix)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconFonts {
    #[serde(default)]
    pub fontawesome_brands: Vec<String>,
    #[serde(default)]
    pub fontawesome_regular: Vec<String>,
    #[serde(default)]
    pub fontawesome_solid: Vec<String>,
    #[serde(default)]
    pub ionicons: Vec<String>,
    #[serde(default)]
    pub themify: Vec<String>,
}

/// Custom uploaded icon set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Single icon inside a custom set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomIcon {
    pub id: String,
    pub set_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "attachment_id", skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyLabels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_name: Option<String>,
}

/// Taxonomy description as the host exports it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<TaxonomyLabels>,
}

impl HostData {
    /// Parse a snapshot from JSON text
    pub fn from_json(source: &str) -> CommonResult<Self> {
        let data: HostData = serde_json::from_str(source)?;
        debug!(
            components = data.components.len(),
            enabled = data.enabled_component_ids.len(),
            "Loaded host snapshot"
        );
        Ok(data)
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> CommonResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn is_enabled(&self, component_id: &str) -> bool {
        self.enabled_component_ids.iter().any(|id| id == component_id)
    }

    pub fn global_class_name(&self, class_id: &str) -> Option<&str> {
        self.global_classes
            .iter()
            .find(|class| class.id == class_id)
            .map(|class| class.name.as_str())
    }

    pub fn icon_set(&self, set_id: &str) -> Option<&IconSet> {
        self.icon_sets.iter().find(|set| set.id == set_id)
    }

    pub fn custom_icons_in_set<'a>(&'a self, set_id: &'a str) -> impl Iterator<Item = &'a CustomIcon> {
        self.custom_icons.iter().filter(move |icon| icon.set_id == set_id)
    }

    pub fn custom_icon(&self, icon_id: &str) -> Option<&CustomIcon> {
        self.custom_icons.iter().find(|icon| icon.id == icon_id)
    }

    /// Taxonomies as `(value, label)` pairs, preferring the singular name
    pub fn taxonomy_options(&self) -> Vec<(String, String)> {
        self.taxonomies
            .iter()
            .map(|(key, info)| {
                let label = info
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.singular_name.clone())
                    .or_else(|| info.label.clone())
                    .unwrap_or_else(|| key.clone());
                (key.clone(), label)
            })
            .collect()
    }
}

/// Deserialize a field, falling back to its default when the shape is wrong
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    match serde_json::from_value(raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(error = %err, "Ignoring malformed host snapshot field");
            Ok(T::default())
        }
    }
}
