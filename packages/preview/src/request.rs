use blocks_schema::{is_removable, AttributeMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attributes sent to the server renderer
///
/// Only `componentId`, `blockId` and the non-empty properties travel. An
/// empty property map is left out entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub component_id: String,

    pub block_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl PreviewRequest {
    pub fn from_attributes(attrs: &AttributeMap) -> Self {
        let properties: Map<String, Value> = attrs
            .properties
            .iter()
            .filter(|(_, value)| !is_removable(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            component_id: attrs.component_id.clone(),
            block_id: attrs.block_id.clone(),
            properties: if properties.is_empty() { None } else { Some(properties) },
        }
    }
}

/// Body of the preview POST
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RenderBody<'a> {
    pub attributes: &'a PreviewRequest,
}
