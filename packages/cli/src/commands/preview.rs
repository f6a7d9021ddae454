use crate::config::{load_attributes, Loaded};
use anyhow::{anyhow, Result};
use blocks_editor::{BlockEditSession, BlockRegistrar};
use blocks_preview::{HttpRenderer, PreviewRenderer, PreviewRequest};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Host snapshot (JSON)
    pub snapshot: PathBuf,

    /// Block name or component id
    pub block: String,

    /// Stored block attributes (JSON)
    #[arg(short, long)]
    pub attributes: Option<PathBuf>,

    /// Directory holding component-blocks.config.json
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Block id to send when the attributes have none
    #[arg(long, default_value = "cli-preview")]
    pub block_id: String,

    /// POST the payload to the preview endpoint and print the markup
    #[arg(long)]
    pub render: bool,

    /// Preview endpoint, overriding previewEndpoint from the config
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub fn preview(args: PreviewArgs) -> Result<()> {
    let loaded = Loaded::load(&args.snapshot, args.config_dir.as_deref())?;
    let registry = BlockRegistrar::new(loaded.host.clone(), loaded.settings.clone()).register_all();
    let registration = super::find_block(&registry, &args.block)?;

    let attrs = load_attributes(args.attributes.as_deref(), registration.component_id())?;
    let mut session = BlockEditSession::new(registration, attrs, loaded.host.clone(), loaded.settings.clone())?;
    session.mount(&args.block_id, Instant::now());
    let request = PreviewRequest::from_attributes(session.attributes());

    if !args.render {
        println!("{}", serde_json::to_string_pretty(&json!({ "attributes": request }))?);
        return Ok(());
    }

    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| loaded.settings.preview_endpoint.clone())
        .ok_or_else(|| anyhow!("No preview endpoint; pass --endpoint or set previewEndpoint"))?;
    let renderer = HttpRenderer::new(endpoint);
    info!(block_name = %registration.name, url = %renderer.url_for(&registration.name), "Requesting preview");

    let runtime = tokio::runtime::Runtime::new()?;
    let markup = runtime.block_on(renderer.render(&registration.name, &request))?;

    eprintln!("{} {} bytes", "Rendered".green().bold(), markup.len());
    println!("{}", markup);
    Ok(())
}
