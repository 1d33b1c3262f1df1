// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Model Alias Resolution
//
// Builds one adapter per configured model and resolves model aliases to
// them. A failed generation is returned as-is; review units are never
// retried.

use crate::domain::config::{resolve_secret, LLMProviderConfig, ModelConfig};
use crate::domain::llm::{GenerationOptions, GenerationResponse, LLMError, LLMProvider};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::anthropic::AnthropicAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;

/// Registry for managing LLM providers and resolving model aliases
#[derive(Default)]
pub struct ProviderRegistry {
    /// alias -> (provider name, adapter)
    aliases: BTreeMap<String, (String, Arc<dyn LLMProvider>)>,
}

impl ProviderRegistry {
    /// Build the registry from the configured providers.
    ///
    /// Disabled providers are skipped; a provider that cannot be constructed
    /// (unknown type, missing secret) is logged and skipped.
    pub fn from_config(providers: &[LLMProviderConfig]) -> Self {
        let mut registry = Self::default();
        info!("Initializing LLM provider registry");

        for provider_config in providers {
            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", provider_config.name);
                continue;
            }

            let api_key = match resolve_secret(&provider_config.api_key) {
                Ok(key) => key.unwrap_or_default(),
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                    continue;
                }
            };

            for model_config in &provider_config.models {
                match Self::create_provider(provider_config, model_config, &api_key) {
                    Ok(provider) => {
                        info!(
                            "Mapping alias '{}' -> {} ({})",
                            model_config.alias, model_config.model, provider_config.name
                        );
                        registry.aliases.insert(
                            model_config.alias.clone(),
                            (provider_config.name.clone(), provider),
                        );
                    }
                    Err(e) => {
                        warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                        break;
                    }
                }
            }
        }

        if registry.aliases.is_empty() {
            warn!("No LLM providers configured - review units will fail until one is added");
        }
        registry
    }

    fn create_provider(
        config: &LLMProviderConfig,
        model: &ModelConfig,
        api_key: &str,
    ) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
            "openai" => Arc::new(OpenAIAdapter::new(
                config.endpoint.clone(),
                api_key.to_string(),
                model.model.clone(),
            )),
            // LM Studio, vLLM and other OpenAI-compatible servers
            "openai-compatible" => Arc::new(OpenAIAdapter::with_provider_label(
                config.endpoint.clone(),
                api_key.to_string(),
                model.model.clone(),
                config.name.clone(),
            )),
            "ollama" => Arc::new(OllamaAdapter::new(config.endpoint.clone(), model.model.clone())),
            "anthropic" => Arc::new(AnthropicAdapter::new(
                config.endpoint.clone(),
                api_key.to_string(),
                model.model.clone(),
            )),
            _ => anyhow::bail!("Unsupported provider type: {}", config.provider_type),
        };
        Ok(provider)
    }

    /// Register an adapter under `alias`, replacing any previous one
    pub fn register(&mut self, alias: impl Into<String>, provider_name: impl Into<String>, provider: Arc<dyn LLMProvider>) {
        self.aliases.insert(alias.into(), (provider_name.into(), provider));
    }

    pub fn provider(&self, alias: &str) -> Option<Arc<dyn LLMProvider>> {
        self.aliases.get(alias).map(|(_, provider)| provider.clone())
    }

    /// Generate text using a model alias
    pub async fn generate(
        &self,
        alias: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let (provider_name, provider) = self
            .aliases
            .get(alias)
            .ok_or_else(|| LLMError::ModelNotFound(format!("Model alias '{}' not found", alias)))?;
        debug!(alias = %alias, provider = %provider_name, "Dispatching generation");
        provider.generate(prompt, options).await
    }

    /// Check health of every registered alias
    pub async fn health_check_all(&self) -> BTreeMap<String, Result<(), LLMError>> {
        let mut results = BTreeMap::new();
        for (alias, (provider_name, provider)) in &self.aliases {
            info!("Health checking provider '{}' for alias '{}'", provider_name, alias);
            results.insert(alias.clone(), provider.health_check().await);
        }
        results
    }

    /// Get list of available model aliases
    pub fn available_aliases(&self) -> Vec<String> {
        self.aliases.keys().cloned().collect()
    }

    /// Check if a model alias exists
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }
}

/// A registry pinned to one alias, usable wherever an [`LLMProvider`] is expected
pub struct AliasedProvider {
    registry: Arc<ProviderRegistry>,
    alias: String,
}

impl AliasedProvider {
    pub fn new(registry: Arc<ProviderRegistry>, alias: impl Into<String>) -> Self {
        Self {
            registry,
            alias: alias.into(),
        }
    }
}

#[async_trait]
impl LLMProvider for AliasedProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        self.registry.generate(&self.alias, prompt, options).await
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        match self.registry.provider(&self.alias) {
            Some(provider) => provider.health_check().await,
            None => Err(LLMError::ModelNotFound(format!(
                "Model alias '{}' not found",
                self.alias
            ))),
        }
    }
}
