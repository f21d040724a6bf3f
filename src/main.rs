mod cli;
mod dispatcher;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    if !use_color {
        colored::control::set_override(false);
    }

    // Initialize logging (RUST_LOG overrides; diagnostics go to stderr)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color && std::io::stderr().is_terminal())
        .init();

    dispatcher::dispatch(&cli)
}
