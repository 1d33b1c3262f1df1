// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process swarm stack
//!
//! Wires store, extractor, LLM providers, reviewer profiles and the
//! dispatcher from one configuration manifest. Used by `review run` and by
//! the `serve` daemon.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use swarm_review_core::{
    application::LlmReviewExecutor,
    domain::config::{resolve_secret, SwarmConfigManifest},
    infrastructure::{
        event_bus::EventBus,
        extraction::{CodeExtractor, ExtractionLimits},
        github::GitHubClient,
        llm::{AliasedProvider, ProviderRegistry},
        store::{CoordinationStore, InMemoryStoreBackend},
    },
};
use swarm_review_swarm::application::SwarmDispatcher;

pub struct SwarmStack {
    pub dispatcher: SwarmDispatcher,
    pub event_bus: Arc<EventBus>,
    pub llm_registry: Arc<ProviderRegistry>,
}

impl SwarmStack {
    pub fn from_config(config: &SwarmConfigManifest) -> Result<Self> {
        let spec = &config.spec;

        let llm_registry = Arc::new(ProviderRegistry::from_config(&spec.llm_providers));
        let alias = spec.analysis.model_alias.as_str();
        if !llm_registry.has_alias(alias) {
            anyhow::bail!(
                "No enabled LLM provider serves model alias '{}' (available: {})",
                alias,
                llm_registry.available_aliases().join(", ")
            );
        }
        info!(alias = %alias, "Analysis model resolved");

        let github_token =
            resolve_secret(&spec.github.token).context("Failed to resolve GitHub token")?;
        let extractor = CodeExtractor::new(
            ExtractionLimits::from(&spec.extraction),
            GitHubClient::new(spec.github.api_url.clone(), github_token),
        );
        let llm = Arc::new(AliasedProvider::new(llm_registry.clone(), alias));
        let executor = Arc::new(LlmReviewExecutor::new(extractor, llm, &spec.analysis));

        let store = CoordinationStore::new(
            Arc::new(InMemoryStoreBackend::new()),
            spec.store.key_prefix.clone(),
            spec.store.session_ttl(),
        );
        let registry = Arc::new(config.reviewer_registry());
        debug!(reviewers = ?registry.reviewer_types(), "Reviewer profiles loaded");

        let event_bus = Arc::new(EventBus::with_default_capacity());
        let dispatcher = SwarmDispatcher::new(store, registry, executor, spec)
            .with_publisher(event_bus.clone());

        Ok(Self {
            dispatcher,
            event_bus,
            llm_registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_review_core::domain::config::{LLMProviderConfig, ModelConfig};

    fn provider(alias: &str) -> LLMProviderConfig {
        LLMProviderConfig {
            name: "local".to_string(),
            provider_type: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            enabled: true,
            models: vec![ModelConfig {
                alias: alias.to_string(),
                model: "qwen2.5-coder:7b".to_string(),
                context_window: 32768,
            }],
        }
    }

    #[test]
    fn test_stack_requires_analysis_alias() {
        let mut config = SwarmConfigManifest::default();
        config.spec.llm_providers = vec![provider("fast")];
        let err = SwarmStack::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("'default'"));

        config.spec.analysis.model_alias = "fast".to_string();
        let stack = SwarmStack::from_config(&config).unwrap();
        assert!(stack.llm_registry.has_alias("fast"));
    }
}
