use crate::error::CommonError;
use crate::result::CommonResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "component-blocks.config.json";

/// Longest debounce or sampling delay a config file may set
pub const MAX_DELAY_MS: u64 = 60_000;

/// Editor tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Prefix for registered block names (`<namespace>/<component id>`)
    #[serde(default = "default_block_namespace")]
    pub block_namespace: String,

    /// Quiet window before attribute changes trigger a preview render
    #[serde(default = "default_attribute_debounce_ms")]
    pub attribute_debounce_ms: u64,

    /// Quiet window before a search term triggers an option fetch
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Search terms shorter than this never reach the server
    #[serde(default = "default_min_search_chars")]
    pub min_search_chars: usize,

    /// Rendered markup shorter than this is never cached
    #[serde(default = "default_min_markup_length")]
    pub min_markup_length: usize,

    /// Delay before sampling markup for hosts without a completion signal
    #[serde(default = "default_initial_sample_delay_ms")]
    pub initial_sample_delay_ms: u64,

    #[serde(default = "default_sample_delay_ms")]
    pub sample_delay_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_endpoint: Option<String>,

    #[serde(default = "default_ajax_endpoint")]
    pub ajax_endpoint: String,
}

fn default_block_namespace() -> String {
    "component-blocks".to_string()
}

fn default_attribute_debounce_ms() -> u64 {
    300
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_min_search_chars() -> usize {
    3
}

fn default_min_markup_length() -> usize {
    50
}

fn default_initial_sample_delay_ms() -> u64 {
    2000
}

fn default_sample_delay_ms() -> u64 {
    1500
}

fn default_ajax_endpoint() -> String {
    "/wp-admin/admin-ajax.php".to_string()
}

impl EditorSettings {
    /// Load settings from a directory, falling back to defaults
    pub fn load(dir: &Path) -> CommonResult<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(EditorSettings::default())
        }
    }

    /// Parse settings, rejecting delays above `MAX_DELAY_MS`
    pub fn from_json(source: &str) -> CommonResult<Self> {
        let settings: EditorSettings = serde_json::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> CommonResult<()> {
        let delays = [
            ("attributeDebounceMs", self.attribute_debounce_ms),
            ("searchDebounceMs", self.search_debounce_ms),
            ("initialSampleDelayMs", self.initial_sample_delay_ms),
            ("sampleDelayMs", self.sample_delay_ms),
        ];
        match delays.into_iter().find(|(_, value)| *value > MAX_DELAY_MS) {
            Some((field, value)) => Err(CommonError::DelayTooLong {
                field,
                value,
                max: MAX_DELAY_MS,
            }),
            None => Ok(()),
        }
    }

    pub fn attribute_debounce(&self) -> Duration {
        Duration::from_millis(self.attribute_debounce_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn initial_sample_delay(&self) -> Duration {
        Duration::from_millis(self.initial_sample_delay_ms)
    }

    pub fn sample_delay(&self) -> Duration {
        Duration::from_millis(self.sample_delay_ms)
    }

    /// Registered block name for a component
    pub fn block_name(&self, component_id: &str) -> String {
        format!("{}/{}", self.block_namespace, component_id)
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            block_namespace: default_block_namespace(),
            attribute_debounce_ms: default_attribute_debounce_ms(),
            search_debounce_ms: default_search_debounce_ms(),
            min_search_chars: default_min_search_chars(),
            min_markup_length: default_min_markup_length(),
            initial_sample_delay_ms: default_initial_sample_delay_ms(),
            sample_delay_ms: default_sample_delay_ms(),
            preview_endpoint: None,
            ajax_endpoint: default_ajax_endpoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_settings() {
        let json = r#"{
            "blockNamespace": "acme",
            "attributeDebounceMs": 150,
            "previewEndpoint": "https://example.com/render"
        }"#;

        let settings: EditorSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.block_namespace, "acme");
        assert_eq!(settings.attribute_debounce(), Duration::from_millis(150));
        assert_eq!(settings.search_debounce(), Duration::from_millis(500));
        assert_eq!(settings.preview_endpoint.as_deref(), Some("https://example.com/render"));
        assert_eq!(settings.block_name("abc"), "acme/abc");
    }

    #[test]
    fn test_default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.attribute_debounce_ms, 300);
        assert_eq!(settings.min_search_chars, 3);
        assert_eq!(settings.min_markup_length, 50);
        assert_eq!(settings.ajax_endpoint, "/wp-admin/admin-ajax.php");
    }

    #[test]
    fn test_absurd_delay_is_rejected() {
        let result = EditorSettings::from_json(r#"{ "sampleDelayMs": 18446744073709551615 }"#);
        assert!(matches!(
            result,
            Err(CommonError::DelayTooLong { field: "sampleDelayMs", max: MAX_DELAY_MS, .. })
        ));

        let settings = EditorSettings::from_json(r#"{ "searchDebounceMs": 800 }"#).unwrap();
        assert_eq!(settings.search_debounce(), Duration::from_millis(800));
    }

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let dir = std::env::temp_dir().join("component_blocks_settings_missing");
        let settings = EditorSettings::load(&dir).unwrap();
        assert_eq!(settings, EditorSettings::default());
    }
}
