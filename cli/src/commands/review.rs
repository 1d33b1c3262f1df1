// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Review commands
//!
//! Commands: run, submit, status

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use swarm_review_core::domain::config::SwarmConfigManifest;
use swarm_review_core::domain::report::UnifiedReport;
use swarm_review_core::domain::session::SwarmStatus;
use swarm_review_swarm::domain::{ReviewerProgressStatus, SessionStatusView};

use crate::daemon::{check_daemon_running, DaemonClient, DaemonStatus};
use crate::embedded::SwarmStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
pub enum ReviewCommand {
    /// Run a swarm in-process and print the unified report
    Run {
        /// Local path or GitHub repository URL
        #[arg(value_name = "TARGET")]
        target: String,

        /// Reviewer types (comma separated; default from configuration)
        #[arg(short, long, value_delimiter = ',')]
        reviewers: Vec<String>,

        /// Seconds to wait for reviewers before aggregating
        #[arg(long)]
        timeout: Option<u64>,

        /// Report format
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Submit a review to a running daemon
    Submit {
        /// Local path (as seen by the daemon) or GitHub repository URL
        #[arg(value_name = "TARGET")]
        target: String,

        /// Reviewer types (comma separated; default from daemon configuration)
        #[arg(short, long, value_delimiter = ',')]
        reviewers: Vec<String>,

        /// Seconds the daemon waits for reviewers before aggregating
        #[arg(long)]
        timeout: Option<u64>,

        /// Poll until the session finishes
        #[arg(short, long)]
        wait: bool,
    },

    /// Show the status of a session on a running daemon
    Status {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },
}

pub async fn handle_command(
    command: ReviewCommand,
    config_path: Option<PathBuf>,
    host: &str,
    port: u16,
) -> Result<()> {
    match command {
        ReviewCommand::Run {
            target,
            reviewers,
            timeout,
            format,
            output,
        } => run(config_path, &target, reviewers, timeout, format, output).await,
        ReviewCommand::Submit {
            target,
            reviewers,
            timeout,
            wait,
        } => {
            let client = connect(host, port).await?;
            submit(&client, &target, reviewers, timeout, wait).await
        }
        ReviewCommand::Status { session_id } => {
            let client = connect(host, port).await?;
            let view = client.review_status(&session_id).await?;
            print_status(&view);
            Ok(())
        }
    }
}

async fn connect(host: &str, port: u16) -> Result<DaemonClient> {
    match check_daemon_running(host, port).await? {
        DaemonStatus::Running { .. } => DaemonClient::new(host, port),
        DaemonStatus::Unhealthy { error } => {
            anyhow::bail!("Daemon at {}:{} is unhealthy: {}", host, port, error)
        }
        DaemonStatus::Stopped => anyhow::bail!(
            "No daemon reachable at {}:{}. Start one with `swarm-review serve` or use `review run`.",
            host,
            port
        ),
    }
}

fn non_empty(reviewers: Vec<String>) -> Option<Vec<String>> {
    let reviewers: Vec<String> = reviewers
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    (!reviewers.is_empty()).then_some(reviewers)
}

async fn run(
    config_path: Option<PathBuf>,
    target: &str,
    reviewers: Vec<String>,
    timeout: Option<u64>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = SwarmConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let stack = SwarmStack::from_config(&config)?;
    info!(target = %target, "Running swarm review");
    eprintln!("Reviewing {}...", target.bold());

    let report = stack
        .dispatcher
        .run_swarm(target, non_empty(reviewers), timeout)
        .await
        .context("Swarm review failed")?;

    let rendered = render_report(&report, format)?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            eprintln!("{}", format!("✓ Report written: {}", path.display()).green());
        }
        None => println!("{}", rendered),
    }

    if !report.reviewers_failed.is_empty() {
        eprintln!(
            "{}",
            format!(
                "⚠ Reviewers without results: {}",
                report.reviewers_failed.join(", ")
            )
            .yellow()
        );
    }
    Ok(())
}

async fn submit(
    client: &DaemonClient,
    target: &str,
    reviewers: Vec<String>,
    timeout: Option<u64>,
    wait: bool,
) -> Result<()> {
    let reviewers = non_empty(reviewers);
    let created = client
        .submit_review(target, reviewers.as_deref(), timeout)
        .await?;

    println!(
        "{}",
        format!("✓ Review submitted: {}", created.session_id).green()
    );
    println!("  Poll: {}", created.poll_url);

    if !wait {
        return Ok(());
    }

    println!("Waiting for completion...");
    loop {
        let view = client.review_status(created.session_id.as_str()).await?;
        if view.status.is_terminal() {
            print_status(&view);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}

pub fn render_report(report: &UnifiedReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(report.to_markdown()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
    }
}

fn print_status(view: &SessionStatusView) {
    println!("Session {}", view.session_id.to_string().bold());
    println!("  Status: {}", format_status(view.status));
    println!("  Reviewers:");
    for (reviewer_type, progress) in &view.reviewers {
        println!(
            "    {:<14} {:<10} {:>3}%  {} findings",
            reviewer_type,
            format_progress(progress.status),
            progress.progress_percent,
            progress.findings_count
        );
    }

    if let Some(report) = &view.unified_report {
        println!();
        println!("{}", report.to_markdown());
    }
}

fn format_status(status: SwarmStatus) -> colored::ColoredString {
    match status {
        SwarmStatus::Pending => "pending".normal(),
        SwarmStatus::InProgress => "in_progress".yellow(),
        SwarmStatus::Aggregating => "aggregating".yellow(),
        SwarmStatus::Complete => "complete".green(),
        SwarmStatus::Failed => "failed".red(),
    }
}

fn format_progress(status: ReviewerProgressStatus) -> colored::ColoredString {
    match status {
        ReviewerProgressStatus::Pending => "pending".normal(),
        ReviewerProgressStatus::Running => "running".yellow(),
        ReviewerProgressStatus::Success => "success".green(),
        ReviewerProgressStatus::Failed => "failed".red(),
        ReviewerProgressStatus::Timeout => "timeout".red(),
    }
}
