//! slotkit CLI application
//!
//! Drives the slotkit core from the command line: `fetch` wraps an HTTP GET
//! in an operation controller with the configured retry and cache policy,
//! `stream` consumes a chunked response and prints text as it arrives.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/slotkit-cli
//! ```

mod args;
mod commands;
mod console;

use anyhow::Result;
use args::{Cli, Commands, ConfigAction};
use clap::Parser;
use slotkit_core::{LoggingConfig, SlotkitConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SlotkitConfig::load(Some(&cli.config_file))?;
    init_logging(&config.logging, cli.verbose);

    tracing::debug!(config_file = %cli.config_file.display(), "configuration loaded");

    match cli.command {
        Commands::Fetch(args) => commands::fetch::execute(args, &config, cli.verbose).await,
        Commands::Stream(args) => commands::stream::execute(args, &config, cli.verbose).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&cli.config_file, &config),
            ConfigAction::Init { force } => commands::config::init(&cli.config_file, force),
        },
    }
}

/// Initialize logging
///
/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.pretty().init(),
    }
}
