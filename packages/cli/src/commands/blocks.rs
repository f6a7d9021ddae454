use crate::config::Loaded;
use anyhow::Result;
use blocks_editor::BlockRegistrar;
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// Host snapshot (JSON)
    pub snapshot: PathBuf,

    /// Directory holding component-blocks.config.json
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn blocks(args: BlocksArgs) -> Result<()> {
    let loaded = Loaded::load(&args.snapshot, args.config_dir.as_deref())?;
    let registry = BlockRegistrar::new(loaded.host.clone(), loaded.settings.clone()).register_all();

    match args.format.as_str() {
        "json" => {
            let output = json!({
                "category": registry.category,
                "blocks": registry.blocks,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => {
            if let Some(category) = &registry.category {
                println!("Category: {} ({})", category.title.bold(), category.slug);
                println!();
            }
            for block in &registry.blocks {
                let marker = if block.is_editable() {
                    "●".green()
                } else {
                    "○".dimmed()
                };
                let controls = block
                    .component
                    .editable_properties()
                    .filter(|property| !property.label.is_empty())
                    .count();
                println!("{} {:<40} {}", marker, block.name, block.title);
                if block.is_editable() {
                    println!("    controls: {}", controls);
                } else {
                    println!("    {}", "disabled, hidden from inserter".dimmed());
                }
            }
            if registry.is_empty() {
                println!("{}", "No component blocks registered".yellow());
            }
        }
        other => return Err(anyhow::anyhow!("Unknown format: {}. Use: text or json", other)),
    }

    Ok(())
}
