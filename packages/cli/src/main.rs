mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{blocks, controls, inspect, preview, BlocksArgs, ControlsArgs, InspectArgs, PreviewArgs};
use tracing_subscriber::{fmt, EnvFilter};

/// Component blocks - inspect and exercise component block definitions
#[derive(Parser, Debug)]
#[command(name = "component-blocks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a host snapshot
    Inspect(InspectArgs),

    /// List the block registrations a snapshot produces
    Blocks(BlocksArgs),

    /// Print the edit surface of one block
    Controls(ControlsArgs),

    /// Print, or send, the preview payload of one block
    Preview(PreviewArgs),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Inspect(args) => inspect(args),
        Command::Blocks(args) => blocks(args),
        Command::Controls(args) => controls(args),
        Command::Preview(args) => preview(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
