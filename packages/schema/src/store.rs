use crate::attributes::AttributeMap;
use crate::coerce::{coerce, is_removable};
use crate::component::ComponentDefinition;
use crate::kind::PropertyKind;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Single write path from controls into a block's attribute map
///
/// Controls never write properties directly. Every change goes through
/// `update`, which removes empty values, coerces the rest and swaps in a new
/// property map only when content actually changed.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    component: Arc<ComponentDefinition>,
}

impl PropertyStore {
    pub fn new(component: Arc<ComponentDefinition>) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &ComponentDefinition {
        &self.component
    }

    pub fn kind_of(&self, property_id: &str) -> PropertyKind {
        self.component.property_kind(property_id)
    }

    /// Current stored value of a property
    pub fn read<'a>(&self, attrs: &'a AttributeMap, property_id: &str) -> Option<&'a Value> {
        attrs.get(property_id)
    }

    /// Apply a raw control value
    ///
    /// Returns `true` when the attribute map changed.
    pub fn update(&self, attrs: &mut AttributeMap, property_id: &str, raw: Value) -> bool {
        let kind = self.kind_of(property_id);
        let canonical = if self.keeps_array(property_id, &kind, &raw) {
            raw
        } else {
            coerce(&raw, &kind)
        };

        // Coercion can empty a value, e.g. an object under a scalar type
        if is_removable(&canonical) {
            if !attrs.properties.contains_key(property_id) {
                return false;
            }
            let mut next = (*attrs.properties).clone();
            next.remove(property_id);
            attrs.properties = Arc::new(next);
            debug!(component_id = %self.component.id, property_id, "Removed property override");
            return true;
        }

        if attrs.properties.get(property_id) == Some(&canonical) {
            trace!(property_id, "Property unchanged");
            return false;
        }

        let mut next = (*attrs.properties).clone();
        next.insert(property_id.to_string(), canonical);
        attrs.properties = Arc::new(next);
        debug!(component_id = %self.component.id, property_id, kind = %kind, "Updated property");
        true
    }

    /// Multi-value selects store the chosen set as an array
    fn keeps_array(&self, property_id: &str, kind: &PropertyKind, raw: &Value) -> bool {
        raw.is_array()
            && *kind == PropertyKind::Select
            && self
                .component
                .property(property_id)
                .map_or(false, |property| property.multiple)
    }

    /// Remove a property override so it inherits the component default
    pub fn clear(&self, attrs: &mut AttributeMap, property_id: &str) -> bool {
        self.update(attrs, property_id, Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> PropertyStore {
        let component = ComponentDefinition::new("card")
            .with_property(PropertyDefinition::new("title", PropertyKind::Text, "Title"))
            .with_property(PropertyDefinition::new("tags", PropertyKind::Class, "Tags"))
            .with_property(PropertyDefinition::new("link", PropertyKind::Link, "Link"))
            .with_property(PropertyDefinition::new("size", PropertyKind::Select, "Size"))
            .with_property(PropertyDefinition::new("tone", PropertyKind::Select, "Tone").multiple())
            .with_property(PropertyDefinition::new("swatch", PropertyKind::from("color"), "Swatch"));
        PropertyStore::new(Arc::new(component))
    }

    #[test]
    fn test_update_coerces_by_declared_kind() {
        let store = store();
        let mut attrs = AttributeMap::for_component("card");

        store.update(&mut attrs, "title", json!(["a", "b"]));
        store.update(&mut attrs, "tags", json!(["x", "y"]));
        store.update(&mut attrs, "size", json!(["lg", "sm"]));

        assert_eq!(
            Value::Object((*attrs.properties).clone()),
            json!({ "title": "a, b", "tags": ["x", "y"], "size": "lg" })
        );
    }

    #[test]
    fn test_multiple_select_keeps_array() {
        let store = store();
        let mut attrs = AttributeMap::for_component("card");
        store.update(&mut attrs, "tone", json!(["warm", "cool"]));
        assert_eq!(attrs.get("tone"), Some(&json!(["warm", "cool"])));
    }

    #[test]
    fn test_undeclared_property_is_treated_as_text() {
        let store = store();
        let mut attrs = AttributeMap::for_component("card");
        store.update(&mut attrs, "ghost", json!({ "name": "Boo" }));
        assert_eq!(attrs.get("ghost"), Some(&json!("Boo")));
    }

    #[test]
    fn test_unrecognized_kind_uses_generic_rule() {
        let store = store();
        let mut attrs = AttributeMap::for_component("card");

        store.update(&mut attrs, "swatch", json!(["red", "blue"]));
        assert_eq!(attrs.get("swatch"), Some(&json!("red")));

        assert!(store.update(&mut attrs, "swatch", json!({ "a": 1 })));
        assert!(attrs.get("swatch").is_none());
    }

    #[test]
    fn test_empty_values_remove_key() {
        let store = store();
        for empty in [json!(null), json!(""), json!([]), json!({})] {
            let mut attrs = AttributeMap::for_component("card");
            store.update(&mut attrs, "title", json!("Hello"));
            assert!(store.update(&mut attrs, "title", empty.clone()), "{empty}");
            assert!(attrs.get("title").is_none());
        }
    }

    #[test]
    fn test_false_link_is_kept_as_override() {
        let store = store();
        let mut attrs = AttributeMap::for_component("card");
        store.update(&mut attrs, "link", json!(false));
        assert_eq!(attrs.get("link"), Some(&json!(false)));
    }

    #[test]
    fn test_identity_changes_only_with_content() {
        let store = store();
        let mut attrs = AttributeMap::for_component("card");
        store.update(&mut attrs, "title", json!("Hello"));

        let before = attrs.clone();
        assert!(!store.update(&mut attrs, "title", json!("Hello")));
        assert!(!store.update(&mut attrs, "size", json!("")));
        assert!(attrs.shares_properties_with(&before));

        assert!(store.update(&mut attrs, "title", json!("Bye")));
        assert!(!attrs.shares_properties_with(&before));
        assert_eq!(before.get("title"), Some(&json!("Hello")));
    }
}
