use crate::config::{load_attributes, Loaded};
use anyhow::Result;
use blocks_editor::{BlockEditSession, BlockRegistrar};
use blocks_preview::HttpOptionFetcher;
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug)]
pub struct ControlsArgs {
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

    /// Output format (outline, json)
    #[arg(short, long, default_value = "outline")]
    pub format: String,

    /// Leave the preview region out, as hosts without a renderer do
    #[arg(long)]
    pub no_preview: bool,

    /// Run the initial option fetches against the site's ajax endpoint
    #[arg(long)]
    pub fetch: bool,
}

pub fn controls(args: ControlsArgs) -> Result<()> {
    let loaded = Loaded::load(&args.snapshot, args.config_dir.as_deref())?;
    let registry = BlockRegistrar::new(loaded.host.clone(), loaded.settings.clone()).register_all();
    let registration = super::find_block(&registry, &args.block)?;

    let tree = if registration.is_editable() {
        let attrs = load_attributes(args.attributes.as_deref(), registration.component_id())?;
        let mut session = BlockEditSession::new(registration, attrs, loaded.host.clone(), loaded.settings.clone())?;
        if args.no_preview {
            session = session.without_preview();
        }
        let update = session.mount("cli", Instant::now());

        if args.fetch && !update.fetches.is_empty() {
            let ajax_url = loaded
                .host
                .ajax_url
                .clone()
                .unwrap_or_else(|| loaded.settings.ajax_endpoint.clone());
            let fetcher = HttpOptionFetcher::new(ajax_url, loaded.host.nonce.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            let applied = runtime.block_on(session.run_fetches(&fetcher, update.fetches));
            info!(applied, "Ran option fetches");
        }
        session.render()
    } else {
        registration.placeholder_node(&loaded.host.i18n)
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&tree)?),
        "outline" => print!("{}", tree.outline()),
        other => return Err(anyhow::anyhow!("Unknown format: {}. Use: outline or json", other)),
    }
    Ok(())
}
