//! Tokio driver for one block's preview
//!
//! The reconciler stays sans-IO; this task owns it, sleeps until its next
//! deadline, runs render jobs concurrently and publishes every display
//! change on a watch channel.

use crate::error::{PreviewError, PreviewResult};
use crate::reconciler::{PreviewDisplay, PreviewReconciler, RenderJob};
use crate::renderer::PreviewRenderer;
use blocks_schema::AttributeMap;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Idle wake-up when nothing is scheduled
const IDLE_WAKE: Duration = Duration::from_secs(3600);

#[derive(Debug)]
enum Command {
    AttributesChanged(AttributeMap),
    RenderNow(AttributeMap),
    Shutdown,
}

type RenderOutcome = (u64, PreviewResult<String>);

/// Handle to a running preview task
#[derive(Debug)]
pub struct PreviewHandle {
    commands: mpsc::Sender<Command>,
    display: watch::Receiver<PreviewDisplay>,
    task: JoinHandle<()>,
}

impl PreviewHandle {
    /// Report new block attributes; the render follows after the debounce
    pub async fn update(&self, attrs: AttributeMap) -> PreviewResult<()> {
        self.send(Command::AttributesChanged(attrs)).await
    }

    /// Render without waiting for the debounce window
    pub async fn render_now(&self, attrs: AttributeMap) -> PreviewResult<()> {
        self.send(Command::RenderNow(attrs)).await
    }

    async fn send(&self, command: Command) -> PreviewResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PreviewError::ServiceStopped)
    }

    pub fn display(&self) -> PreviewDisplay {
        self.display.borrow().clone()
    }

    /// Wait for the next display change
    pub async fn changed(&mut self) -> PreviewResult<PreviewDisplay> {
        self.display.changed().await.map_err(|_| PreviewError::ServiceStopped)?;
        Ok(self.display.borrow().clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewDisplay> {
        self.display.clone()
    }

    /// Stop the task, abandoning in-flight renders
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let _ = self.task.await;
    }
}

pub struct PreviewService;

impl PreviewService {
    /// Start the preview task for one block
    pub fn spawn(reconciler: PreviewReconciler, renderer: Arc<dyn PreviewRenderer>) -> PreviewHandle {
        let (commands, receiver) = mpsc::channel(32);
        let (publisher, display) = watch::channel(reconciler.display().clone());
        let task = tokio::spawn(run(reconciler, renderer, receiver, publisher));
        PreviewHandle {
            commands,
            display,
            task,
        }
    }
}

fn start_render(renderer: &Arc<dyn PreviewRenderer>, job: RenderJob) -> BoxFuture<'static, RenderOutcome> {
    let renderer = renderer.clone();
    async move {
        let result = renderer.render(&job.block_name, &job.request).await;
        (job.seq, result)
    }
    .boxed()
}

#[instrument(skip_all, fields(block_name = %reconciler.block_name()))]
async fn run(
    mut reconciler: PreviewReconciler,
    renderer: Arc<dyn PreviewRenderer>,
    mut commands: mpsc::Receiver<Command>,
    publisher: watch::Sender<PreviewDisplay>,
) {
    info!("Preview task started");
    let mut renders: FuturesUnordered<BoxFuture<'static, RenderOutcome>> = FuturesUnordered::new();

    loop {
        let wake = reconciler
            .next_deadline()
            .map(Instant::from_std)
            .unwrap_or_else(|| Instant::now() + IDLE_WAKE);

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::AttributesChanged(attrs)) => {
                    reconciler.attributes_changed(&attrs, Instant::now().into_std());
                }
                Some(Command::RenderNow(attrs)) => {
                    if let Some(job) = reconciler.request_now(&attrs) {
                        renders.push(start_render(&renderer, job));
                    }
                }
                Some(Command::Shutdown) | None => {
                    reconciler.unmount();
                    break;
                }
            },
            _ = tokio::time::sleep_until(wake) => {
                if let Some(job) = reconciler.poll(Instant::now().into_std()) {
                    renders.push(start_render(&renderer, job));
                }
                // hosts sampling a live document act on this; completions never wait for it
                if reconciler.sample_due(Instant::now().into_std()) {
                    debug!("Preview sample window elapsed");
                }
            },
            Some((seq, result)) = renders.next(), if !renders.is_empty() => {
                reconciler.render_completed(seq, result);
            },
        }

        publisher.send_if_modified(|display| {
            if display == reconciler.display() {
                false
            } else {
                *display = reconciler.display().clone();
                true
            }
        });
    }

    info!("Preview task stopped");
}
