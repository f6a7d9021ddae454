//! # Preview Reconciler
//!
//! Decides when to ask for a fresh server render and what the preview region
//! shows meanwhile.
//!
//! ```text
//!  attributes_changed ──► debounce (300ms) ──► poll ──► RenderJob
//!                                                         │
//!  display: Loading { cached } ◄───────────────────────────┘
//!                                                         │
//!  render_completed(seq, Ok(markup)) ──► Rendered(markup), cache if valid
//!  render_completed(seq, Err(_))     ──► Failed(message), cache kept
//! ```
//!
//! While a render is outstanding the last good markup stays on screen, so
//! typing never flashes a loading placeholder once something has rendered.

use crate::error::PreviewError;
use crate::request::PreviewRequest;
use blocks_common::{EditorSettings, I18n, TimerSlot};
use blocks_controls::ControlNode;
use blocks_schema::AttributeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Marker carried by markup that was itself produced from the cache
pub const CACHED_MARKER: &str = "data-cached";

/// Render to dispatch to a `PreviewRenderer`
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub seq: u64,
    pub block_name: String,
    pub request: PreviewRequest,
}

/// What the preview region shows
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewDisplay {
    /// Nothing requested yet
    Idle,

    /// Render outstanding; `cached` is the last good markup if any
    Loading { cached: Option<String> },

    Rendered(String),

    Failed(String),
}

#[derive(Debug)]
pub struct PreviewReconciler {
    block_name: String,
    min_markup_length: usize,
    /// Localized loading and error texts; markup containing them is never cached
    placeholders: Vec<String>,
    debounce: TimerSlot<PreviewRequest>,
    sample: TimerSlot<()>,
    initial_sample: std::time::Duration,
    /// Last subset scheduled or dispatched
    latest: Option<PreviewRequest>,
    next_seq: u64,
    in_flight: Option<u64>,
    /// Newest sequence whose outcome was applied
    applied_seq: u64,
    cached: Option<String>,
    display: PreviewDisplay,
    active: bool,
}

impl PreviewReconciler {
    pub fn new(block_name: impl Into<String>, settings: &EditorSettings, i18n: &I18n) -> Self {
        Self {
            block_name: block_name.into(),
            min_markup_length: settings.min_markup_length,
            placeholders: vec![
                i18n.get("loadingComponentPreview").to_string(),
                i18n.get("componentPreviewError").to_string(),
            ],
            debounce: TimerSlot::new(settings.attribute_debounce()),
            sample: TimerSlot::new(settings.sample_delay()),
            initial_sample: settings.initial_sample_delay(),
            latest: None,
            next_seq: 0,
            in_flight: None,
            applied_seq: 0,
            cached: None,
            display: PreviewDisplay::Idle,
            active: true,
        }
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    pub fn display(&self) -> &PreviewDisplay {
        &self.display
    }

    pub fn cached(&self) -> Option<&str> {
        self.cached.as_deref()
    }

    pub fn is_rendering(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Schedule a render for new attributes
    ///
    /// Returns `false` when the render subset did not change. A pending
    /// debounce is restarted with the newest snapshot.
    pub fn attributes_changed(&mut self, attrs: &AttributeMap, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        let request = PreviewRequest::from_attributes(attrs);
        if self.latest.as_ref() == Some(&request) {
            return false;
        }

        debug!(block_name = %self.block_name, "Preview attributes changed");
        self.latest = Some(request.clone());
        self.debounce.schedule(now, request);
        true
    }

    /// Render immediately, bypassing the debounce
    pub fn request_now(&mut self, attrs: &AttributeMap) -> Option<RenderJob> {
        if !self.active {
            return None;
        }
        self.debounce.cancel();
        let request = PreviewRequest::from_attributes(attrs);
        self.latest = Some(request.clone());
        Some(self.dispatch(request))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.sample.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Issue the debounced render if its window elapsed
    pub fn poll(&mut self, now: Instant) -> Option<RenderJob> {
        let request = self.debounce.poll(now)?;
        if !self.active {
            return None;
        }
        let job = self.dispatch(request);

        let delay = if self.cached.is_none() {
            self.initial_sample
        } else {
            self.sample.delay()
        };
        self.sample.schedule_after(now, delay, ());
        Some(job)
    }

    fn dispatch(&mut self, request: PreviewRequest) -> RenderJob {
        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        self.display = PreviewDisplay::Loading {
            cached: self.cached.clone(),
        };
        debug!(block_name = %self.block_name, seq = self.next_seq, "Dispatching preview render");

        RenderJob {
            seq: self.next_seq,
            block_name: self.block_name.clone(),
            request,
        }
    }

    /// Markup worth keeping for later loading states
    pub fn is_cacheable(&self, markup: &str) -> bool {
        let trimmed = markup.trim();
        !trimmed.is_empty()
            && markup.len() > self.min_markup_length
            && !self
                .placeholders
                .iter()
                .any(|placeholder| !placeholder.is_empty() && markup.contains(placeholder.as_str()))
            && !markup.contains(CACHED_MARKER)
            && self.cached.as_deref() != Some(markup)
    }

    /// Apply a renderer outcome
    ///
    /// Outcomes older than one already applied are dropped, so a slow early
    /// request never replaces a newer preview. Returns whether it was applied.
    pub fn render_completed(&mut self, seq: u64, result: Result<String, PreviewError>) -> bool {
        if !self.active || seq <= self.applied_seq || seq > self.next_seq {
            debug!(block_name = %self.block_name, seq, "Ignoring stale preview render");
            return false;
        }

        self.applied_seq = seq;
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
        let superseded = self.in_flight.is_some();

        match result {
            Ok(markup) => {
                if self.is_cacheable(&markup) {
                    self.cached = Some(markup.clone());
                }
                self.display = if superseded {
                    PreviewDisplay::Loading {
                        cached: self.cached.clone(),
                    }
                } else {
                    PreviewDisplay::Rendered(markup)
                };
            }
            Err(error) => {
                warn!(block_name = %self.block_name, seq, error = %error, "Preview render failed");
                if !superseded {
                    self.display = PreviewDisplay::Failed(error.to_string());
                }
            }
        }
        true
    }

    /// Whether a host sampling markup out of a live document should do so now
    pub fn sample_due(&mut self, now: Instant) -> bool {
        self.active && self.sample.poll(now).is_some()
    }

    /// Offer sampled markup to the cache; returns whether it was taken
    pub fn capture_sample(&mut self, markup: &str) -> bool {
        if !self.active || !self.is_cacheable(markup) {
            return false;
        }
        self.cached = Some(markup.to_string());
        true
    }

    /// Resume after `unmount`
    ///
    /// Renders dispatched before the unmount stay stale. The next
    /// `attributes_changed` schedules a fresh render even for the same subset.
    pub fn mount(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.latest = None;
        self.applied_seq = self.next_seq;
        if matches!(self.display, PreviewDisplay::Loading { .. }) {
            self.display = match &self.cached {
                Some(markup) => PreviewDisplay::Rendered(markup.clone()),
                None => PreviewDisplay::Idle,
            };
        }
        debug!(block_name = %self.block_name, "Preview remounted");
    }

    /// Cancel timers and forget in-flight renders
    pub fn unmount(&mut self) {
        self.active = false;
        self.debounce.cancel();
        self.sample.cancel();
        self.in_flight = None;
    }

    /// Preview region as a node tree
    pub fn render(&self, i18n: &I18n) -> ControlNode {
        let region = ControlNode::element("div").with_key("render-wrapper");
        match &self.display {
            PreviewDisplay::Rendered(markup) => region.with_child(ControlNode::markup(markup.clone())),
            PreviewDisplay::Loading { cached: Some(markup) } => region.with_child(
                ControlNode::element("div")
                    .with_key("cached-content")
                    .with_attr(CACHED_MARKER, "true")
                    .with_style("opacity", "0.98")
                    .with_child(ControlNode::markup(markup.clone())),
            ),
            PreviewDisplay::Idle | PreviewDisplay::Loading { cached: None } => region.with_child(
                ControlNode::element("div")
                    .with_key("loading")
                    .with_style("opacity", "0.5")
                    .with_child(ControlNode::text(i18n.get("loadingComponentPreview"))),
            ),
            PreviewDisplay::Failed(message) => region.with_child(
                ControlNode::element("div")
                    .with_key("preview-error")
                    .with_attr("data-error", message.clone())
                    .with_style("border", "2px dashed #e65100")
                    .with_child(ControlNode::element("p").with_child(ControlNode::text(i18n.get("componentPreviewError"))))
                    .with_child(
                        ControlNode::element("p").with_child(ControlNode::text(i18n.get("componentConfiguredButPreview"))),
                    ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    const MARKUP_A: &str = "<div class=\"wp-block-hero\"><h2>First heading for the hero block</h2></div>";
    const MARKUP_B: &str = "<div class=\"wp-block-hero\"><h2>Second heading for the hero block</h2></div>";

    fn reconciler() -> PreviewReconciler {
        PreviewReconciler::new("component-blocks/hero", &EditorSettings::default(), &I18n::new())
    }

    fn attrs(title: &str) -> AttributeMap {
        AttributeMap::for_component("hero").with_properties(json!({ "title": title }).as_object().cloned().unwrap())
    }

    #[test]
    fn test_burst_of_changes_sends_last_snapshot_once() {
        let mut preview = reconciler();
        let start = Instant::now();

        preview.attributes_changed(&attrs("a"), start);
        preview.attributes_changed(&attrs("ab"), start + Duration::from_millis(100));
        preview.attributes_changed(&attrs("abc"), start + Duration::from_millis(200));

        assert!(preview.poll(start + Duration::from_millis(300)).is_none());
        let job = preview.poll(start + Duration::from_millis(500)).unwrap();
        assert_eq!(job.request.properties.unwrap()["title"], json!("abc"));
        assert!(preview.poll(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_unchanged_subset_does_not_reschedule() {
        let mut preview = reconciler();
        let now = Instant::now();
        assert!(preview.attributes_changed(&attrs("a"), now));
        assert!(!preview.attributes_changed(&attrs("a"), now));
    }

    #[test]
    fn test_cached_markup_stays_visible_while_loading() {
        let mut preview = reconciler();
        let now = Instant::now();

        let first = preview.request_now(&attrs("a")).unwrap();
        assert_eq!(preview.display(), &PreviewDisplay::Loading { cached: None });
        assert!(preview.render_completed(first.seq, Ok(MARKUP_A.to_string())));
        assert_eq!(preview.display(), &PreviewDisplay::Rendered(MARKUP_A.to_string()));

        preview.attributes_changed(&attrs("b"), now);
        let second = preview.poll(now + Duration::from_millis(300)).unwrap();
        assert_eq!(
            preview.display(),
            &PreviewDisplay::Loading {
                cached: Some(MARKUP_A.to_string())
            }
        );
        assert!(preview.render(&I18n::new()).find_key("cached-content").is_some());

        assert!(preview.render_completed(second.seq, Ok(MARKUP_B.to_string())));
        assert_eq!(preview.cached(), Some(MARKUP_B));
    }

    #[test]
    fn test_invalid_markup_is_shown_but_not_cached() {
        let i18n = I18n::new().with("loadingComponentPreview", "Loading component preview...");
        let mut preview = PreviewReconciler::new("component-blocks/hero", &EditorSettings::default(), &i18n);

        let job = preview.request_now(&attrs("a")).unwrap();
        preview.render_completed(job.seq, Ok("<p>short</p>".to_string()));
        assert_eq!(preview.display(), &PreviewDisplay::Rendered("<p>short</p>".to_string()));
        assert_eq!(preview.cached(), None);

        let placeholder = format!("<div>{}</div>{}", "Loading component preview...", "x".repeat(60));
        assert!(!preview.is_cacheable(&placeholder));
        assert!(!preview.is_cacheable(&format!("<div data-cached=\"true\">{}</div>", "x".repeat(60))));
        assert!(preview.capture_sample(MARKUP_A));
        assert!(!preview.capture_sample(MARKUP_A));
    }

    #[test]
    fn test_late_response_never_regresses_preview() {
        let mut preview = reconciler();
        let first = preview.request_now(&attrs("a")).unwrap();
        let second = preview.request_now(&attrs("b")).unwrap();

        assert!(preview.render_completed(second.seq, Ok(MARKUP_B.to_string())));
        assert!(!preview.render_completed(first.seq, Ok(MARKUP_A.to_string())));
        assert_eq!(preview.display(), &PreviewDisplay::Rendered(MARKUP_B.to_string()));
        assert_eq!(preview.cached(), Some(MARKUP_B));
    }

    #[test]
    fn test_failure_shows_error_and_keeps_cache() {
        let mut preview = reconciler();
        let first = preview.request_now(&attrs("a")).unwrap();
        preview.render_completed(first.seq, Ok(MARKUP_A.to_string()));

        let second = preview.request_now(&attrs("b")).unwrap();
        preview.render_completed(second.seq, Err(PreviewError::Render("boom".to_string())));
        assert!(matches!(preview.display(), PreviewDisplay::Failed(_)));
        assert_eq!(preview.cached(), Some(MARKUP_A));
        assert!(preview.render(&I18n::new()).find_key("preview-error").is_some());

        // a later success supersedes the error
        let third = preview.request_now(&attrs("c")).unwrap();
        preview.render_completed(third.seq, Ok(MARKUP_B.to_string()));
        assert_eq!(preview.display(), &PreviewDisplay::Rendered(MARKUP_B.to_string()));
    }

    #[test]
    fn test_sample_timer_uses_initial_delay_first() {
        let mut preview = reconciler();
        let now = Instant::now();
        preview.attributes_changed(&attrs("a"), now);
        let dispatched = now + Duration::from_millis(300);
        preview.poll(dispatched).unwrap();

        assert!(!preview.sample_due(dispatched + Duration::from_millis(1500)));
        assert!(preview.sample_due(dispatched + Duration::from_millis(2000)));
        assert!(!preview.sample_due(dispatched + Duration::from_millis(4000)));
    }

    #[test]
    fn test_unmount_drops_everything() {
        let mut preview = reconciler();
        let now = Instant::now();
        let job = preview.request_now(&attrs("a")).unwrap();
        preview.attributes_changed(&attrs("b"), now);
        preview.unmount();

        assert!(preview.next_deadline().is_none());
        assert!(!preview.render_completed(job.seq, Ok(MARKUP_A.to_string())));
        assert!(!preview.attributes_changed(&attrs("c"), now));
    }

    #[test]
    fn test_remount_resumes_rendering() {
        let mut preview = reconciler();
        let now = Instant::now();
        let early = preview.request_now(&attrs("a")).unwrap();
        preview.unmount();
        preview.mount();

        assert_eq!(preview.display(), &PreviewDisplay::Idle);
        assert!(!preview.render_completed(early.seq, Ok(MARKUP_A.to_string())));

        assert!(preview.attributes_changed(&attrs("a"), now));
        let job = preview.poll(now + Duration::from_millis(300)).unwrap();
        assert!(job.seq > early.seq);
        assert!(preview.render_completed(job.seq, Ok(MARKUP_A.to_string())));
        assert_eq!(preview.display(), &PreviewDisplay::Rendered(MARKUP_A.to_string()));
    }
}
