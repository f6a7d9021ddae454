//! # Block Registration
//!
//! One registration per declared component, keyed `<namespace>/<component id>`:
//!
//! - enabled components become editable blocks with the attribute schema
//!   `{componentId, properties, blockId}`
//! - disabled components become inert placeholders hidden from the
//!   inserter, so content that still references them keeps loading
//!
//! Malformed components are skipped with a warning and never abort the pass.

use blocks_common::{EditorSettings, HostData, I18n};
use blocks_controls::ControlNode;
use blocks_schema::{ComponentDefinition, SchemaError};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Category every component block is filed under
pub const BLOCK_CATEGORY: &str = "components";

/// Localized string, or `fallback` when the host has no translation
pub(crate) fn localized<'a>(i18n: &'a I18n, key: &'a str, fallback: &'a str) -> &'a str {
    if i18n.contains(key) {
        i18n.get(key)
    } else {
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockCategory {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationKind {
    Editable,
    /// Component exists but is disabled on this site
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSupports {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub align: Vec<String>,
    pub inserter: bool,
    pub html: bool,
    pub custom_class_name: bool,
    pub anchor: bool,
}

/// Everything the host needs to register one block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRegistration {
    pub name: String,
    pub kind: RegistrationKind,
    pub title: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub supports: BlockSupports,
    /// Attribute schema in the host's `{type, default}` form
    pub attributes: Value,
    #[serde(skip)]
    pub component: Arc<ComponentDefinition>,
}

impl BlockRegistration {
    pub fn component_id(&self) -> &str {
        &self.component.id
    }

    pub fn is_editable(&self) -> bool {
        self.kind == RegistrationKind::Editable
    }

    /// Static notice drawn for a placeholder block
    pub fn placeholder_node(&self, i18n: &I18n) -> ControlNode {
        let label = format!(
            "{}: {}",
            localized(i18n, "blockNotAvailable", "Block not available"),
            self.title
        );
        ControlNode::element("Placeholder")
            .with_key("disabled-component")
            .with_attr("icon", "warning")
            .with_attr("label", label)
            .with_attr(
                "instructions",
                localized(
                    i18n,
                    "componentNotEnabledInstructions",
                    "Enable this component for the block editor to edit it.",
                ),
            )
    }
}

/// Why a raw component was left out of the pass
#[derive(Debug)]
pub struct SkippedComponent {
    pub index: usize,
    pub error: SchemaError,
}

/// Result of one registration pass
#[derive(Debug, Default)]
pub struct BlockRegistry {
    pub category: Option<BlockCategory>,
    pub blocks: Vec<BlockRegistration>,
    pub skipped: Vec<SkippedComponent>,
}

impl BlockRegistry {
    pub fn get(&self, block_name: &str) -> Option<&BlockRegistration> {
        self.blocks.iter().find(|block| block.name == block_name)
    }

    pub fn for_component(&self, component_id: &str) -> Option<&BlockRegistration> {
        self.blocks.iter().find(|block| block.component_id() == component_id)
    }

    pub fn editable(&self) -> impl Iterator<Item = &BlockRegistration> {
        self.blocks.iter().filter(|block| block.is_editable())
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &BlockRegistration> {
        self.blocks.iter().filter(|block| !block.is_editable())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Turns the host's component list into block registrations
#[derive(Debug, Clone)]
pub struct BlockRegistrar {
    host: Arc<HostData>,
    settings: Arc<EditorSettings>,
}

impl BlockRegistrar {
    pub fn new(host: Arc<HostData>, settings: Arc<EditorSettings>) -> Self {
        Self { host, settings }
    }

    pub fn category(&self) -> BlockCategory {
        BlockCategory {
            slug: BLOCK_CATEGORY.to_string(),
            title: localized(&self.host.i18n, "components", "Components").to_string(),
        }
    }

    /// Register every well-formed component
    ///
    /// Enabled components come first in declaration order, then placeholders
    /// for the disabled ones. A repeated component id keeps the first
    /// definition.
    #[instrument(skip_all, fields(components = self.host.components.len()))]
    pub fn register_all(&self) -> BlockRegistry {
        let mut registry = BlockRegistry::default();
        let mut seen = HashSet::new();
        let mut parsed = Vec::new();

        for (index, raw) in self.host.components.iter().enumerate() {
            match ComponentDefinition::from_value(raw) {
                Ok(component) => {
                    if !seen.insert(component.id.clone()) {
                        warn!(component_id = %component.id, "Duplicate component id, keeping the first");
                        continue;
                    }
                    parsed.push(Arc::new(component));
                }
                Err(error) => {
                    warn!(index, error = %error, "Skipping malformed component");
                    registry.skipped.push(SkippedComponent { index, error });
                }
            }
        }

        let (enabled, disabled): (Vec<_>, Vec<_>) = parsed
            .into_iter()
            .partition(|component| self.host.is_enabled(&component.id));

        registry
            .blocks
            .extend(enabled.into_iter().map(|component| self.editable(component)));
        registry
            .blocks
            .extend(disabled.into_iter().map(|component| self.placeholder(component)));

        if !registry.is_empty() {
            registry.category = Some(self.category());
        }

        info!(
            editable = registry.editable().count(),
            placeholders = registry.placeholders().count(),
            skipped = registry.skipped.len(),
            "Registered component blocks"
        );
        registry
    }

    fn editable(&self, component: Arc<ComponentDefinition>) -> BlockRegistration {
        let name = self.settings.block_name(&component.id);
        debug!(block_name = %name, "Registering editable block");

        BlockRegistration {
            title: component.display_name(&self.host.i18n),
            kind: RegistrationKind::Editable,
            category: BLOCK_CATEGORY.to_string(),
            description: component.description.clone(),
            keywords: self.keywords(),
            supports: BlockSupports {
                align: vec!["wide".to_string(), "full".to_string()],
                inserter: true,
                html: false,
                custom_class_name: false,
                anchor: false,
            },
            attributes: json!({
                "componentId": { "type": "string", "default": component.id },
                "properties": { "type": "object", "default": {} },
                "blockId": { "type": "string", "default": "" }
            }),
            name,
            component,
        }
    }

    fn placeholder(&self, component: Arc<ComponentDefinition>) -> BlockRegistration {
        let name = self.settings.block_name(&component.id);
        debug!(block_name = %name, "Registering placeholder for disabled component");

        BlockRegistration {
            title: component.display_name(&self.host.i18n),
            kind: RegistrationKind::Placeholder,
            category: BLOCK_CATEGORY.to_string(),
            description: None,
            keywords: self.keywords(),
            supports: BlockSupports {
                align: Vec::new(),
                inserter: false,
                html: false,
                custom_class_name: false,
                anchor: false,
            },
            attributes: json!({
                "componentId": { "type": "string", "default": component.id },
                "properties": { "type": "object", "default": {} }
            }),
            name,
            component,
        }
    }

    fn keywords(&self) -> Vec<String> {
        vec![
            self.settings.block_namespace.clone(),
            localized(&self.host.i18n, "component", "Component").to_string(),
        ]
    }
}
