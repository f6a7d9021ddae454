use crate::config::Loaded;
use anyhow::Result;
use blocks_editor::BlockRegistrar;
use blocks_schema::{ComponentDefinition, PropertyKind};
use clap::Args;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Host snapshot (JSON)
    pub snapshot: PathBuf,

    /// Directory holding component-blocks.config.json
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let loaded = Loaded::load(&args.snapshot, args.config_dir.as_deref())?;
    let host = &loaded.host;

    println!("🔎 {} {}", "Inspecting".green().bold(), args.snapshot.display());
    println!();

    let registry = BlockRegistrar::new(host.clone(), loaded.settings.clone()).register_all();
    println!("   Components:   {}", host.components.len());
    println!("   Enabled:      {}", registry.editable().count());
    println!("   Placeholders: {}", registry.placeholders().count());
    if !registry.skipped.is_empty() {
        println!("   {} {}", "Skipped:".yellow(), registry.skipped.len());
        for skipped in &registry.skipped {
            println!("     {} #{}: {}", "✗".red(), skipped.index, skipped.error);
        }
    }
    println!();

    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    let mut hidden = 0;
    for block in &registry.blocks {
        for property in &block.component.properties {
            *kinds.entry(property.kind.to_string()).or_default() += 1;
            if !property.is_editable() {
                hidden += 1;
            }
            if let PropertyKind::Unknown(tag) = &property.kind {
                println!(
                    "   {} '{}' in {} has unknown type '{}', edited as text",
                    "!".yellow(),
                    property.id,
                    block.component_id(),
                    tag
                );
            }
        }
    }
    println!("   Property types:");
    for (kind, count) in &kinds {
        println!("     {:<14} {}", kind, count);
    }
    if hidden > 0 {
        println!("   Without connections (hidden): {}", hidden);
    }
    println!();

    println!("   Catalogs:");
    println!("     global classes  {}", host.global_classes.len());
    println!("     icon sets       {}", host.icon_sets.len());
    println!("     custom icons    {}", host.custom_icons.len());
    println!("     taxonomies      {}", host.taxonomies.len());
    println!("     post types      {}", host.post_types.len());
    println!("     user roles      {}", host.user_roles.len());
    println!("     templates       {}", host.section_templates.len());
    println!();

    let deferred: Vec<&ComponentDefinition> = registry
        .editable()
        .map(|block| block.component.as_ref())
        .filter(|component| component.properties.iter().any(|property| property.has_deferred_options()))
        .collect();
    if !deferred.is_empty() && host.ajax_url.is_none() {
        println!(
            "   {} {} component(s) fetch options but the snapshot has no ajaxUrl; using {}",
            "!".yellow(),
            deferred.len(),
            loaded.settings.ajax_endpoint
        );
    }

    println!("✨ {}", "Done".green().bold());
    Ok(())
}
