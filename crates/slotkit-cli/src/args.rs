//! CLI argument definitions using clap
//!
//! - slotkit fetch <url>          # Fetch through an operation controller
//! - slotkit stream <url>         # Consume a chunked response
//! - slotkit config show|init     # Utility commands

use clap::{Parser, Subcommand};
use slotkit_core::config::DEFAULT_CONFIG_FILE;
use slotkit_core::stream::Method;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slotkit")]
#[command(about = "slotkit - single-slot async operations with retry, cache and streaming")]
#[command(
    long_about = r#"slotkit - single-slot async operations with retry, cache and streaming

USAGE:
  slotkit fetch <url>                    # GET with the configured retry/cache policy
  slotkit fetch <url> --repeat 3         # Repeat to watch cache hits
  slotkit stream <url> --field t --lines # Stream SSE and print one field
  slotkit config init                    # Create config file
  slotkit config show                    # Show effective config

Environment overrides: SLOTKIT_MAX_ATTEMPTS, SLOTKIT_RETRY_DELAY,
SLOTKIT_STALE_TIME, SLOTKIT_LOG_LEVEL"#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (JSON, TOML or YAML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a URL through an operation controller
    Fetch(FetchArgs),

    /// Stream a URL and print chunks as they arrive
    Stream(StreamArgs),

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// URL to GET
    pub url: String,

    /// Number of times to execute; later rounds may be served from cache
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Delay between repeated rounds, e.g. "500ms"
    #[arg(long, value_parser = humantime_duration)]
    pub interval: Option<std::time::Duration>,

    /// Print the response body of the last round
    #[arg(long)]
    pub body: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StreamArgs {
    /// URL to stream from
    pub url: String,

    /// JSON field (or /pointer) to extract from `data:` chunks
    #[arg(long)]
    pub field: Option<String>,

    /// Split the body into lines before transforming
    #[arg(long)]
    pub lines: bool,

    /// Extra request header, as name=value
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// JSON object sent as the request body
    #[arg(long)]
    pub body: Option<String>,

    /// Request method (GET or POST)
    #[arg(long)]
    pub method: Option<Method>,
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration
    Show,

    /// Create a new configuration file with defaults
    Init {
        /// Overwrite existing file without prompting
        #[arg(long)]
        force: bool,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid header '{}', expected name=value", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid header '{}', name is empty", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn humantime_duration(raw: &str) -> Result<std::time::Duration, String> {
    humantime_serde::re::humantime::parse_duration(raw).map_err(|e| e.to_string())
}
