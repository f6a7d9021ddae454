use crate::error::PreviewResult;
use crate::request::PreviewRequest;
use async_trait::async_trait;

/// Server-side renderer turning block attributes into markup
///
/// A returned `Ok` is the completion signal for that request.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render(&self, block_name: &str, request: &PreviewRequest) -> PreviewResult<String>;
}
