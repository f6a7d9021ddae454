use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Persisted per-block data
///
/// `properties` sits behind an `Arc` so two snapshots can be compared by
/// identity: the store only swaps in a new map when content changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMap {
    #[serde(default)]
    pub component_id: String,

    #[serde(default)]
    pub properties: Arc<Map<String, Value>>,

    #[serde(default)]
    pub block_id: String,
}

impl AttributeMap {
    /// Fresh attributes for a newly inserted block
    ///
    /// No property is overridden, so every property inherits the component
    /// default until edited.
    pub fn for_component(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            properties: Arc::new(Map::new()),
            block_id: String::new(),
        }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Arc::new(properties);
        self
    }

    pub fn get(&self, property_id: &str) -> Option<&Value> {
        self.properties.get(property_id)
    }

    pub fn has_block_id(&self) -> bool {
        !self.block_id.is_empty()
    }

    /// Assign the block id on first render
    ///
    /// Returns `true` when the id was set. An existing id is never replaced.
    pub fn assign_block_id(&mut self, client_id: &str) -> bool {
        if self.has_block_id() || client_id.is_empty() {
            return false;
        }
        debug!(component_id = %self.component_id, block_id = %client_id, "Assigned block id");
        self.block_id = client_id.to_string();
        true
    }

    /// Same property map instance, not merely equal content
    pub fn shares_properties_with(&self, other: &AttributeMap) -> bool {
        Arc::ptr_eq(&self.properties, &other.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_id_is_assigned_once() {
        let mut attrs = AttributeMap::for_component("hero");
        assert!(!attrs.assign_block_id(""));
        assert!(attrs.assign_block_id("client-1"));
        assert!(!attrs.assign_block_id("client-2"));
        assert_eq!(attrs.block_id, "client-1");
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut attrs = AttributeMap::for_component("hero");
        attrs.assign_block_id("b1");
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            json!({ "componentId": "hero", "properties": {}, "blockId": "b1" })
        );
    }

    #[test]
    fn test_missing_keys_deserialize_to_defaults() {
        let attrs: AttributeMap = serde_json::from_value(json!({ "componentId": "x" })).unwrap();
        assert!(attrs.properties.is_empty());
        assert!(!attrs.has_block_id());
    }
}
