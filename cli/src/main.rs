// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # swarm-review CLI
//!
//! The `swarm-review` binary runs multi-reviewer code reviews.
//!
//! ## Commands
//!
//! - `swarm-review serve` - Run the REST daemon
//! - `swarm-review review run|submit|status` - Run a review in-process or through a daemon
//! - `swarm-review config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use swarm_review::commands::{self, ConfigCommand, ReviewCommand};
use swarm_review::daemon::{self, DEFAULT_HOST, DEFAULT_PORT};
use swarm_review_core::domain::config::SwarmConfigManifest;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Swarm review - parallel multi-discipline code review
#[derive(Parser)]
#[command(name = "swarm-review")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SWARM_REVIEW_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: spec.network.port for serve, 8000 otherwise)
    #[arg(long, global = true, env = "SWARM_REVIEW_PORT")]
    port: Option<u16>,

    /// HTTP API host (default: spec.network.bind_address for serve, 127.0.0.1 otherwise)
    #[arg(long, global = true, env = "SWARM_REVIEW_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error; default: spec.observability.logging.level)
    #[arg(long, global = true, env = "SWARM_REVIEW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format (default: spec.observability.logging.format)
    #[arg(long, global = true, env = "SWARM_REVIEW_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST daemon
    #[command(name = "serve")]
    Serve,

    /// Review operations
    #[command(name = "review")]
    Review {
        #[command(subcommand)]
        command: ReviewCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (level, format) = logging_settings(&cli);
    init_logging(&level, format)?;

    match cli.command {
        Some(Commands::Serve) => daemon::start_server(cli.config, cli.host, cli.port).await,
        Some(Commands::Review { command }) => {
            let host = cli.host.as_deref().unwrap_or(DEFAULT_HOST);
            let port = cli.port.unwrap_or(DEFAULT_PORT);
            commands::review::handle_command(command, cli.config, host, port).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Resolve log settings: flags and env first, then the configuration file.
///
/// Runs before the subscriber exists, so configuration errors are ignored
/// here and reported again by the command itself.
fn logging_settings(cli: &Cli) -> (String, LogFormat) {
    let configured = SwarmConfigManifest::load_or_default(cli.config.clone())
        .ok()
        .and_then(|config| config.spec.observability)
        .and_then(|observability| observability.logging);

    let level = cli
        .log_level
        .clone()
        .or_else(|| configured.as_ref().map(|l| l.level.clone()))
        .unwrap_or_else(|| "info".to_string());

    let format = cli.log_format.unwrap_or_else(|| {
        match configured.as_ref().map(|l| l.format.as_str()) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    });

    (level, format)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
