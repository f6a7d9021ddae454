//! HTTP transports for the renderer and deferred option seams

use crate::error::{PreviewError, PreviewResult};
use crate::renderer::PreviewRenderer;
use crate::request::{PreviewRequest, RenderBody};
use async_trait::async_trait;
use blocks_controls::{parse_fetch_response, ControlError, ControlResult, FetchRequest, OptionFetcher, SelectOption};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Posts attributes to `<endpoint>/<block name>` and reads `rendered`
///
/// POST keeps property content out of request URLs and access logs.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
    endpoint: String,
}

impl HttpRenderer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn url_for(&self, block_name: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), block_name)
    }
}

/// Markup out of a renderer response body
///
/// Accepts `{rendered}` or a bare JSON string.
pub fn parse_render_response(body: &Value) -> PreviewResult<String> {
    match body {
        Value::String(markup) => Ok(markup.clone()),
        Value::Object(map) => match map.get("rendered") {
            Some(Value::String(markup)) => Ok(markup.clone()),
            _ => match map.get("message").and_then(Value::as_str) {
                Some(message) => Err(PreviewError::Render(message.to_string())),
                None => Err(PreviewError::MissingMarkup),
            },
        },
        _ => Err(PreviewError::MissingMarkup),
    }
}

#[async_trait]
impl PreviewRenderer for HttpRenderer {
    async fn render(&self, block_name: &str, request: &PreviewRequest) -> PreviewResult<String> {
        let url = self.url_for(block_name);
        debug!(block_name, url = %url, "Requesting server render");

        let response = self
            .client
            .post(&url)
            .json(&RenderBody { attributes: request })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PreviewError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        parse_render_response(&body)
    }
}

/// Runs deferred option fetches as GET requests against the ajax endpoint
#[derive(Debug, Clone)]
pub struct HttpOptionFetcher {
    client: Client,
    ajax_url: String,
    nonce: Option<String>,
}

impl HttpOptionFetcher {
    pub fn new(ajax_url: impl Into<String>, nonce: Option<String>) -> Self {
        Self {
            client: Client::new(),
            ajax_url: ajax_url.into(),
            nonce,
        }
    }

    /// Full request URL with the flattened query string
    pub fn url_for(&self, request: &FetchRequest) -> PreviewResult<String> {
        let query = serde_urlencoded::to_string(request.query_pairs(self.nonce.as_deref()))?;
        let separator = if self.ajax_url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.ajax_url, separator, query))
    }

    async fn get(&self, request: &FetchRequest) -> PreviewResult<Vec<SelectOption>> {
        let url = self.url_for(request)?;
        let body: Value = self.client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(parse_fetch_response(&body))
    }
}

#[async_trait]
impl OptionFetcher for HttpOptionFetcher {
    async fn fetch(&self, request: &FetchRequest) -> ControlResult<Vec<SelectOption>> {
        self.get(request).await.map_err(|error| {
            warn!(
                property_id = %request.property_id,
                action = ?request.action(),
                error = %error,
                "Option fetch failed"
            );
            ControlError::Fetch(error.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_response_shapes() {
        assert_eq!(parse_render_response(&json!({ "rendered": "<p>x</p>" })).unwrap(), "<p>x</p>");
        assert_eq!(parse_render_response(&json!("<p>y</p>")).unwrap(), "<p>y</p>");
        assert!(matches!(
            parse_render_response(&json!({ "code": "err", "message": "Invalid block" })),
            Err(PreviewError::Render(message)) if message == "Invalid block"
        ));
        assert!(matches!(parse_render_response(&json!(42)), Err(PreviewError::MissingMarkup)));
    }

    #[test]
    fn test_fetch_url_encodes_arrays_and_nonce() {
        let fetcher = HttpOptionFetcher::new("https://site.test/wp-admin/admin-ajax.php", Some("n1".to_string()));
        let request = FetchRequest {
            seq: 1,
            property_id: "related".to_string(),
            field: "options".to_string(),
            descriptor: json!({ "action": "bricks_get_posts", "postType": ["page"] }).as_object().cloned().unwrap(),
            search: Some("a b".to_string()),
            include: Vec::new(),
        };

        assert_eq!(
            fetcher.url_for(&request).unwrap(),
            "https://site.test/wp-admin/admin-ajax.php?action=bricks_get_posts&postType%5B%5D=page&search=a+b&nonce=n1"
        );
    }

    #[test]
    fn test_render_url_joins_block_name() {
        let renderer = HttpRenderer::new("https://site.test/wp-json/wp/v2/block-renderer/");
        assert_eq!(
            renderer.url_for("component-blocks/hero"),
            "https://site.test/wp-json/wp/v2/block-renderer/component-blocks/hero"
        );
    }
}
