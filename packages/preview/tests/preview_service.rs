use async_trait::async_trait;
use blocks_common::{EditorSettings, I18n};
use blocks_preview::{
    PreviewDisplay, PreviewError, PreviewReconciler, PreviewRenderer, PreviewRequest, PreviewResult, PreviewService,
};
use blocks_schema::AttributeMap;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

struct RecordingRenderer {
    calls: Mutex<Vec<PreviewRequest>>,
    latency: Duration,
}

impl RecordingRenderer {
    fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            latency,
        })
    }

    fn titles(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.properties.as_ref().unwrap()["title"].as_str().unwrap().to_string())
            .collect()
    }
}

fn markup(title: &str) -> String {
    format!("<div class=\"wp-block-hero\"><h2>{}</h2><p>rendered on the server</p></div>", title)
}

#[async_trait]
impl PreviewRenderer for RecordingRenderer {
    async fn render(&self, _block_name: &str, request: &PreviewRequest) -> PreviewResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        sleep(self.latency).await;

        let title = request
            .properties
            .as_ref()
            .and_then(|properties| properties.get("title"))
            .and_then(|title| title.as_str())
            .unwrap_or_default()
            .to_string();
        if title == "bad" {
            return Err(PreviewError::Render("template missing".to_string()));
        }
        Ok(markup(&title))
    }
}

fn attrs(title: &str) -> AttributeMap {
    let mut attrs =
        AttributeMap::for_component("hero").with_properties(json!({ "title": title }).as_object().cloned().unwrap());
    attrs.assign_block_id("block-1");
    attrs
}

fn reconciler() -> PreviewReconciler {
    PreviewReconciler::new("component-blocks/hero", &EditorSettings::default(), &I18n::new())
}

#[tokio::test(start_paused = true)]
async fn burst_of_updates_renders_once_with_last_snapshot() {
    let renderer = RecordingRenderer::new(Duration::from_millis(50));
    let handle = PreviewService::spawn(reconciler(), renderer.clone());

    handle.update(attrs("a")).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.update(attrs("ab")).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.update(attrs("abc")).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(renderer.titles(), vec!["abc".to_string()]);
    assert_eq!(handle.display(), PreviewDisplay::Rendered(markup("abc")));
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cached_markup_is_shown_while_next_render_runs() {
    let renderer = RecordingRenderer::new(Duration::from_secs(1));
    let handle = PreviewService::spawn(reconciler(), renderer.clone());

    handle.update(attrs("first")).await.unwrap();
    sleep(Duration::from_secs(2)).await;
    assert_eq!(handle.display(), PreviewDisplay::Rendered(markup("first")));

    handle.update(attrs("second")).await.unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(
        handle.display(),
        PreviewDisplay::Loading {
            cached: Some(markup("first"))
        }
    );

    sleep(Duration::from_secs(2)).await;
    assert_eq!(handle.display(), PreviewDisplay::Rendered(markup("second")));
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_render_surfaces_error() {
    let renderer = RecordingRenderer::new(Duration::from_millis(10));
    let mut handle = PreviewService::spawn(reconciler(), renderer.clone());

    handle.render_now(attrs("bad")).await.unwrap();
    let mut display = handle.changed().await.unwrap();
    while matches!(display, PreviewDisplay::Loading { .. }) {
        display = handle.changed().await.unwrap();
    }
    assert_eq!(display, PreviewDisplay::Failed("Renderer failed: template missing".to_string()));
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn stopped_service_rejects_updates() {
    let renderer = RecordingRenderer::new(Duration::from_millis(10));
    let handle = PreviewService::spawn(reconciler(), renderer);
    let watcher = handle.subscribe();
    handle.shutdown().await;

    assert!(watcher.has_changed().is_err());
}
