use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Localized string table
///
/// Lookups never fail: a missing key resolves to the key itself so a control
/// still renders something readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct I18n {
    strings: HashMap<String, String>,
}

impl I18n {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(key.into(), value.into());
        self
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }

    /// First key that has a translation, else the first key
    pub fn get_any<'a>(&'a self, keys: &[&'a str]) -> &'a str {
        keys.iter()
            .find_map(|key| self.strings.get(*key).map(String::as_str))
            .or_else(|| keys.first().copied())
            .unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.strings.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_falls_back_to_key() {
        let i18n = I18n::new().with("loading", "Loading...");
        assert_eq!(i18n.get("loading"), "Loading...");
        assert_eq!(i18n.get("noOptionsFound"), "noOptionsFound");
    }

    #[test]
    fn test_get_any_prefers_first_translated() {
        let i18n = I18n::new().with("post", "Post");
        assert_eq!(i18n.get_any(&["selectPost", "post"]), "Post");
        assert_eq!(i18n.get_any(&["a", "b"]), "a");
    }

    #[test]
    fn test_deserializes_from_flat_map() {
        let i18n: I18n = serde_json::from_str(r#"{ "on": "On", "off": "Off" }"#).unwrap();
        assert_eq!(i18n.get("off"), "Off");
    }
}
