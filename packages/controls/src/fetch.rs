//! Deferred option fetches
//!
//! A control never performs I/O. It emits a `FetchRequest`, the host runs it
//! through an `OptionFetcher`, and the outcome is handed back to the control
//! that issued it. Requests carry the issuing dropdown's sequence number so a
//! late answer to a superseded request is dropped.

use crate::dropdown::SelectOption;
use crate::error::ControlResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Sequence number within the issuing dropdown
    pub seq: u64,

    pub property_id: String,

    /// Dropdown inside the control that asked (`options`, `postId`, `term`, ...)
    pub field: String,

    /// `{action, ...params}` as declared on the property
    pub descriptor: Map<String, Value>,

    pub search: Option<String>,

    /// Values whose labels must resolve even outside the default result page
    pub include: Vec<String>,
}

impl FetchRequest {
    /// Flat query-string pairs
    ///
    /// Arrays become repeated `key[]` pairs. The site nonce is appended last
    /// when one is known.
    pub fn query_pairs(&self, nonce: Option<&str>) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        for (key, value) in &self.descriptor {
            push_pairs(&mut pairs, key, value);
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        for value in &self.include {
            pairs.push(("include[]".to_string(), value.clone()));
        }
        if let Some(nonce) = nonce.filter(|nonce| !nonce.is_empty()) {
            pairs.push(("nonce".to_string(), nonce.to_string()));
        }

        pairs
    }

    pub fn action(&self) -> Option<&str> {
        self.descriptor.get("action").and_then(Value::as_str)
    }
}

fn push_pairs(pairs: &mut Vec<(String, String)>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            let array_key = format!("{}[]", key);
            for item in items {
                pairs.push((array_key.clone(), scalar_text(item)));
            }
        }
        other => pairs.push((key.to_string(), scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Options from a `{success, data}` response body
///
/// `data` maps value to label. Anything else, including `success: false`,
/// yields no options.
pub fn parse_fetch_response(body: &Value) -> Vec<SelectOption> {
    let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        debug!("Option fetch reported no success");
        return Vec::new();
    }

    match body.get("data") {
        Some(Value::Object(data)) => SelectOption::from_map(data),
        Some(Value::Array(items)) => SelectOption::from_array(items),
        _ => Vec::new(),
    }
}

/// Server side of deferred option sets
#[async_trait]
pub trait OptionFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> ControlResult<Vec<SelectOption>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> FetchRequest {
        let descriptor = json!({
            "action": "bricks_get_posts",
            "postType": ["page", "post"],
            "addLanguageToPostTitle": true
        });
        FetchRequest {
            seq: 1,
            property_id: "related".to_string(),
            field: "options".to_string(),
            descriptor: descriptor.as_object().cloned().unwrap(),
            search: Some("hello".to_string()),
            include: vec!["12".to_string(), "40".to_string()],
        }
    }

    #[test]
    fn test_arrays_become_bracket_pairs() {
        let pairs = request().query_pairs(Some("abc123"));
        let as_refs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        assert!(as_refs.contains(&("postType[]", "page")));
        assert!(as_refs.contains(&("postType[]", "post")));
        assert!(as_refs.contains(&("addLanguageToPostTitle", "true")));
        assert!(as_refs.contains(&("search", "hello")));
        assert!(as_refs.contains(&("include[]", "12")));
        assert_eq!(as_refs.last(), Some(&("nonce", "abc123")));
    }

    #[test]
    fn test_nonce_is_optional() {
        let pairs = request().query_pairs(None);
        assert!(pairs.iter().all(|(key, _)| key != "nonce"));
    }

    #[test]
    fn test_parse_response() {
        let options = parse_fetch_response(&json!({
            "success": true,
            "data": { "12": "About", "40": "Contact" }
        }));
        assert_eq!(options.len(), 2);
        assert_eq!(options[0], SelectOption::new("12", "About"));

        assert!(parse_fetch_response(&json!({ "success": false, "data": { "1": "x" } })).is_empty());
        assert!(parse_fetch_response(&json!({ "success": true })).is_empty());
        assert!(parse_fetch_response(&json!("nope")).is_empty());
    }
}
