// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Swarm Configuration Types
//
// Defines the configuration manifest for a swarm review node, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Coordination store key prefix and session TTL
// - Dispatch defaults (reviewer set, timeout, poll interval)
// - Extraction and aggregation limits
// - LLM provider configuration and the model alias used for analysis
// - Custom reviewer profiles
// - Network and observability settings

use crate::domain::profile::{ReviewerRegistry, StaticProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const API_VERSION: &str = "swarm-review/v1";
pub const KIND: &str = "SwarmConfig";
pub const CONFIG_PATH_ENV: &str = "SWARM_REVIEW_CONFIG_PATH";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfigManifest {
    /// API version (must be "swarm-review/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "SwarmConfig")
    pub kind: String,

    /// Node metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Configuration specification
    #[serde(default)]
    pub spec: SwarmConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmConfigSpec {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    /// Additional or overriding reviewer profiles
    #[serde(default)]
    pub reviewers: Vec<ReviewerProfileConfig>,

    /// LLM provider configurations
    #[serde(default)]
    pub llm_providers: Vec<LLMProviderConfig>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Prefix of every coordination key ({prefix}:session:{id}, ...)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Lifetime shared by the session, results and progress keys
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Reviewers used when a request names none
    #[serde(default = "default_reviewers")]
    pub default_reviewers: Vec<String>,

    /// Upper bound on how long results are collected
    #[serde(default = "default_timeout")]
    pub default_timeout_seconds: u64,

    /// Delay between progress polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// File extensions (without dot) eligible for review
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Files above this size are skipped
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Ceiling on the summed line count of extracted files
    #[serde(default = "default_max_total_lines")]
    pub max_total_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum distance between line_start values of duplicate findings
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: u32,

    /// Minimum title similarity (0.0-1.0) for duplicate findings
    #[serde(default = "default_similarity_threshold")]
    pub title_similarity_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Model alias resolved through llm_providers
    #[serde(default = "default_model_alias")]
    pub model_alias: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_github_api")]
    pub api_url: String,

    /// Access token (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerProfileConfig {
    /// Reviewer type this profile registers under
    pub name: String,

    pub prompt: String,

    #[serde(default)]
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Unique provider name (e.g., "ollama-local", "openai")
    pub name: String,

    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: String, // "ollama", "openai", "anthropic", "openai-compatible"

    /// API endpoint URL
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Whether this provider is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Available models on this provider
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model alias referenced by analysis.model_alias
    pub alias: String,

    /// Actual model identifier for the provider API
    pub model: String,

    /// Maximum context window size in tokens
    #[serde(default = "default_context_window")]
    pub context_window: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_key_prefix() -> String {
    "swarm".to_string()
}

fn default_session_ttl() -> u64 {
    86_400
}

fn default_reviewers() -> Vec<String> {
    vec![
        "security".to_string(),
        "performance".to_string(),
        "style".to_string(),
    ]
}

fn default_timeout() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_extensions() -> Vec<String> {
    [
        "py", "js", "jsx", "ts", "tsx", "go", "rs", "java", "kt", "rb", "php", "c", "h", "cpp",
        "hpp", "cs", "swift", "scala",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_file_bytes() -> u64 {
    100 * 1024
}

fn default_max_total_lines() -> usize {
    10_000
}

fn default_line_tolerance() -> u32 {
    3
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_model_alias() -> String {
    "default".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_context_window() -> u32 {
    8192
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            session_ttl_seconds: default_session_ttl(),
        }
    }
}

impl StoreConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_reviewers: default_reviewers(),
            default_timeout_seconds: default_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl DispatchConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_extensions(),
            max_file_bytes: default_max_file_bytes(),
            max_total_lines: default_max_total_lines(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            line_tolerance: default_line_tolerance(),
            title_similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_alias: default_model_alias(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api(),
            token: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for SwarmConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "swarm-review".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: SwarmConfigSpec::default(),
        }
    }
}

/// Resolve a secret from config (supports "env:VAR_NAME" syntax)
pub fn resolve_secret(value: &Option<String>) -> anyhow::Result<Option<String>> {
    match value {
        Some(v) => match v.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name)
                .map(Some)
                .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
            None => Ok(Some(v.clone())),
        },
        None => Ok(None),
    }
}

impl SwarmConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SWARM_REVIEW_CONFIG_PATH environment variable
    /// 2. ./swarm-review.yaml (working directory)
    /// 3. ~/.swarm-review/config.yaml (user home)
    /// 4. /etc/swarm-review/config.yaml (system, Unix) or C:\ProgramData\SwarmReview\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./swarm-review.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".swarm-review").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/swarm-review/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\SwarmReview\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides read through `lookup`, which maps a variable name to its value
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(prefix) = lookup("SWARM_REVIEW_KEY_PREFIX") {
            tracing::info!("Environment override: SWARM_REVIEW_KEY_PREFIX={}", prefix);
            self.spec.store.key_prefix = prefix;
        }

        if let Some(val) = lookup("SWARM_REVIEW_SESSION_TTL_SECONDS") {
            match val.trim().parse::<u64>() {
                Ok(ttl) => {
                    tracing::info!("Environment override: SWARM_REVIEW_SESSION_TTL_SECONDS={}", ttl);
                    self.spec.store.session_ttl_seconds = ttl;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for SWARM_REVIEW_SESSION_TTL_SECONDS: '{}'. Expected seconds. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("SWARM_REVIEW_DEFAULT_REVIEWERS") {
            let reviewers: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if reviewers.is_empty() {
                tracing::warn!("SWARM_REVIEW_DEFAULT_REVIEWERS is empty. Ignoring.");
            } else {
                tracing::info!("Environment override: SWARM_REVIEW_DEFAULT_REVIEWERS={:?}", reviewers);
                self.spec.dispatch.default_reviewers = reviewers;
            }
        }

        if self.spec.github.token.is_none() {
            if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
                self.spec.github.token = Some(token);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;
        if spec.store.key_prefix.trim().is_empty() {
            anyhow::bail!("spec.store.key_prefix cannot be empty");
        }
        if spec.store.session_ttl_seconds == 0 {
            anyhow::bail!("spec.store.session_ttl_seconds must be greater than zero");
        }
        if spec.dispatch.default_reviewers.is_empty() {
            anyhow::bail!("spec.dispatch.default_reviewers cannot be empty");
        }
        if spec.dispatch.poll_interval_ms == 0 {
            anyhow::bail!("spec.dispatch.poll_interval_ms must be greater than zero");
        }
        if spec.extraction.max_total_lines == 0 || spec.extraction.max_file_bytes == 0 {
            anyhow::bail!("spec.extraction limits must be greater than zero");
        }
        if spec.extraction.allowed_extensions.is_empty() {
            anyhow::bail!("spec.extraction.allowed_extensions cannot be empty");
        }
        let threshold = spec.aggregation.title_similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!(
                "spec.aggregation.title_similarity_threshold must be within [0, 1], got {}",
                threshold
            );
        }

        for reviewer in &spec.reviewers {
            if reviewer.name.trim().is_empty() {
                anyhow::bail!("Reviewer profile name cannot be empty");
            }
            if reviewer.prompt.trim().is_empty() {
                anyhow::bail!("Reviewer profile prompt cannot be empty for: {}", reviewer.name);
            }
        }

        for provider in &spec.llm_providers {
            if provider.name.is_empty() {
                anyhow::bail!("LLM provider name cannot be empty");
            }

            if provider.endpoint.is_empty() {
                anyhow::bail!("LLM provider endpoint cannot be empty for: {}", provider.name);
            }

            if provider.models.is_empty() {
                anyhow::bail!("LLM provider must have at least one model: {}", provider.name);
            }

            for model in &provider.models {
                if model.alias.is_empty() {
                    anyhow::bail!("Model alias cannot be empty in provider: {}", provider.name);
                }

                if model.model.is_empty() {
                    anyhow::bail!("Model identifier cannot be empty for alias: {}", model.alias);
                }
            }
        }

        Ok(())
    }

    /// Built-in reviewer profiles plus the configured ones
    pub fn reviewer_registry(&self) -> ReviewerRegistry {
        let mut registry = ReviewerRegistry::with_builtin();
        for reviewer in &self.spec.reviewers {
            registry.register(
                reviewer.name.clone(),
                Arc::new(StaticProfile::new(reviewer.prompt.clone(), reviewer.checklist.clone())),
            );
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = SwarmConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.store.key_prefix, "swarm");
        assert_eq!(
            manifest.spec.dispatch.default_reviewers,
            vec!["security", "performance", "style"]
        );
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: swarm-review/v1
kind: SwarmConfig
metadata:
  name: review-node
spec:
  store:
    key_prefix: review
  aggregation:
    line_tolerance: 5
  reviewers:
    - name: licensing
      prompt: Check license headers
      checklist: ["SPDX header present"]
"#;
        let manifest = SwarmConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.store.key_prefix, "review");
        assert_eq!(manifest.spec.store.session_ttl_seconds, 86_400);
        assert_eq!(manifest.spec.aggregation.line_tolerance, 5);
        assert_eq!(manifest.spec.aggregation.title_similarity_threshold, 0.8);
        assert_eq!(manifest.spec.extraction.max_total_lines, 10_000);
        assert!(manifest.validate().is_ok());

        let registry = manifest.reviewer_registry();
        assert!(registry.contains("licensing"));
        assert!(registry.contains("security"));
    }

    #[test]
    fn test_validation() {
        let mut manifest = SwarmConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.aggregation.title_similarity_threshold = 1.5;
        assert!(manifest.validate().is_err());
        manifest.spec.aggregation.title_similarity_threshold = 0.8;

        manifest.spec.store.session_ttl_seconds = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.store.session_ttl_seconds = 60;

        manifest.spec.dispatch.default_reviewers.clear();
        assert!(manifest.validate().is_err());
        manifest.spec.dispatch.default_reviewers = vec!["style".to_string()];

        manifest.spec.llm_providers.push(LLMProviderConfig {
            name: "invalid".to_string(),
            provider_type: "openai".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            enabled: true,
            models: vec![],
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut manifest = SwarmConfigManifest::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("SWARM_REVIEW_KEY_PREFIX", "ci"),
            ("SWARM_REVIEW_SESSION_TTL_SECONDS", "not-a-number"),
            ("SWARM_REVIEW_DEFAULT_REVIEWERS", "security, testing ,"),
            ("GITHUB_TOKEN", "ghp_test"),
        ]);
        manifest.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(manifest.spec.store.key_prefix, "ci");
        assert_eq!(manifest.spec.store.session_ttl_seconds, 86_400);
        assert_eq!(manifest.spec.dispatch.default_reviewers, vec!["security", "testing"]);
        assert_eq!(manifest.spec.github.token.as_deref(), Some("ghp_test"));
    }

    #[test]
    fn test_resolve_secret() {
        assert_eq!(resolve_secret(&None).unwrap(), None);
        assert_eq!(
            resolve_secret(&Some("literal".to_string())).unwrap().as_deref(),
            Some("literal")
        );
        assert!(resolve_secret(&Some("env:SWARM_REVIEW_SURELY_UNSET_VARIABLE".to_string())).is_err());
    }
}
