//! # Component Block Preview
//!
//! Server-rendered previews for component blocks.
//!
//! ```text
//! AttributeMap ─► PreviewRequest { componentId, blockId, properties? }
//!                        │  debounced by PreviewReconciler
//!                        ▼
//!                 PreviewRenderer::render (HttpRenderer: POST)
//!                        │
//!                        ▼
//!                 PreviewDisplay ─► cached markup kept for loading states
//! ```
//!
//! `PreviewService` drives a reconciler on tokio. Hosts with their own event
//! loop can use `PreviewReconciler` directly.

mod error;
mod reconciler;
mod renderer;
mod request;
mod service;
mod transport;

pub use error::{PreviewError, PreviewResult};
pub use reconciler::{PreviewDisplay, PreviewReconciler, RenderJob, CACHED_MARKER};
pub use renderer::PreviewRenderer;
pub use request::PreviewRequest;
pub use service::{PreviewHandle, PreviewService};
pub use transport::{parse_render_response, HttpOptionFetcher, HttpRenderer};
