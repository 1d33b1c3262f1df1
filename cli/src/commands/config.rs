// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use swarm_review_core::domain::config::{SwarmConfigManifest, CONFIG_PATH_ENV};

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
pub const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./swarm-review.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = SwarmConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./swarm-review.yaml");
        println!("  4. ~/.swarm-review/config.yaml");
        println!("  5. /etc/swarm-review/config.yaml");
        println!();
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Coordination Store:".bold());
    println!("  Key prefix: {}", spec.store.key_prefix);
    println!("  Session TTL: {}s", spec.store.session_ttl_seconds);
    println!();

    println!("{}", "Dispatch:".bold());
    println!("  Default reviewers: {}", spec.dispatch.default_reviewers.join(", "));
    println!("  Timeout: {}s", spec.dispatch.default_timeout_seconds);
    println!("  Poll interval: {}ms", spec.dispatch.poll_interval_ms);
    println!();

    println!("{}", "Aggregation:".bold());
    println!("  Line tolerance: {}", spec.aggregation.line_tolerance);
    println!(
        "  Title similarity threshold: {}",
        spec.aggregation.title_similarity_threshold
    );
    println!();

    println!("{}", "Reviewers:".bold());
    for reviewer_type in config.reviewer_registry().reviewer_types() {
        let custom = spec.reviewers.iter().any(|r| r.name == reviewer_type);
        if custom {
            println!("  {} {}", reviewer_type, "(custom)".dimmed());
        } else {
            println!("  {}", reviewer_type);
        }
    }
    println!();

    println!("{}", "LLM Providers:".bold());
    if spec.llm_providers.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for provider in &spec.llm_providers {
        println!("  {} ({})", provider.name.bold(), provider.provider_type);
        println!("    Endpoint: {}", provider.endpoint);
        if !provider.enabled {
            println!("    {}", "disabled".yellow());
        }
        for model in &provider.models {
            println!("      - {} → {}", model.alias, model.model);
        }
    }
    println!("  Analysis alias: {}", spec.analysis.model_alias);
    println!();

    println!("{}", "Network:".bold());
    println!("  Listen: {}:{}", spec.network.bind_address, spec.network.port);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = SwarmConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in [MINIMAL_TEMPLATE, EXAMPLES_TEMPLATE] {
            let config = SwarmConfigManifest::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_examples_template_declares_custom_reviewer() {
        let config = SwarmConfigManifest::from_yaml_str(EXAMPLES_TEMPLATE).unwrap();
        let registry = config.reviewer_registry();
        assert!(registry.contains("accessibility"));
        assert!(registry.contains("security"));
    }

    #[tokio::test]
    async fn test_generate_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swarm-review.yaml");
        generate(path.clone(), false).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, MINIMAL_TEMPLATE);
    }
}
