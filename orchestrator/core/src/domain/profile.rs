// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Reviewer Profiles
//!
//! A reviewer profile is the prompt and checklist of one review discipline.
//! Profiles are looked up by `reviewer_type` in a [`ReviewerRegistry`] that is
//! built once at startup and injected wherever it is needed.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Capability interface of a review discipline.
pub trait ReviewerProfile: Send + Sync {
    /// Instructions that frame the analysis.
    fn prompt(&self) -> &str;

    /// Items the reviewer must check.
    fn checklist(&self) -> &[String];
}

/// Profile whose prompt and checklist are plain owned data.
#[derive(Debug, Clone)]
pub struct StaticProfile {
    prompt: String,
    checklist: Vec<String>,
}

impl StaticProfile {
    pub fn new(prompt: impl Into<String>, checklist: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            checklist,
        }
    }

    fn from_parts(prompt: &str, items: &[&str]) -> Self {
        Self::new(prompt, items.iter().map(|s| s.to_string()).collect())
    }
}

impl ReviewerProfile for StaticProfile {
    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn checklist(&self) -> &[String] {
        &self.checklist
    }
}

/// Registry of profiles keyed by reviewer type.
#[derive(Clone, Default)]
pub struct ReviewerRegistry {
    profiles: BTreeMap<String, Arc<dyn ReviewerProfile>>,
}

impl ReviewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in disciplines.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for (name, profile) in builtin_profiles() {
            registry.register(name, Arc::new(profile));
        }
        registry
    }

    /// Register (or replace) the profile for `reviewer_type`.
    pub fn register(&mut self, reviewer_type: impl Into<String>, profile: Arc<dyn ReviewerProfile>) {
        self.profiles.insert(reviewer_type.into(), profile);
    }

    pub fn get(&self, reviewer_type: &str) -> Option<Arc<dyn ReviewerProfile>> {
        self.profiles.get(reviewer_type).cloned()
    }

    pub fn contains(&self, reviewer_type: &str) -> bool {
        self.profiles.contains_key(reviewer_type)
    }

    /// Registered reviewer types, sorted.
    pub fn reviewer_types(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Resolve requested types against the registry, keeping request order and
    /// dropping unknown types and repeats.
    pub fn resolve(&self, requested: &[String]) -> Vec<(String, Arc<dyn ReviewerProfile>)> {
        let mut resolved: Vec<(String, Arc<dyn ReviewerProfile>)> = Vec::new();
        for reviewer_type in requested {
            if resolved.iter().any(|(name, _)| name == reviewer_type) {
                continue;
            }
            if let Some(profile) = self.get(reviewer_type) {
                resolved.push((reviewer_type.clone(), profile));
            }
        }
        resolved
    }
}

fn builtin_profiles() -> Vec<(&'static str, StaticProfile)> {
    vec![
        (
            "security",
            StaticProfile::from_parts(
                "You are a security reviewer. Identify vulnerabilities an attacker could exploit \
                 and unsafe handling of data, secrets and privileges.",
                &[
                    "Injection (SQL, command, template, path traversal)",
                    "Hardcoded secrets, tokens or credentials",
                    "Missing authentication or authorization checks",
                    "Unsafe deserialization or eval of untrusted input",
                    "Weak or misused cryptography",
                    "Sensitive data written to logs or error messages",
                ],
            ),
        ),
        (
            "performance",
            StaticProfile::from_parts(
                "You are a performance reviewer. Identify code that wastes CPU, memory or I/O \
                 or that will not scale with input size.",
                &[
                    "Quadratic or worse loops over growing collections",
                    "N+1 queries and repeated remote calls inside loops",
                    "Blocking I/O on async or latency-sensitive paths",
                    "Unbounded caches, buffers or queues",
                    "Redundant allocation, copying or serialization",
                ],
            ),
        ),
        (
            "style",
            StaticProfile::from_parts(
                "You are a code style reviewer. Identify readability and maintainability \
                 problems that make the code harder to change safely.",
                &[
                    "Unclear or inconsistent naming",
                    "Functions that are too long or do too many things",
                    "Duplicated logic",
                    "Dead code and commented-out code",
                    "Missing or misleading documentation on public items",
                ],
            ),
        ),
        (
            "architecture",
            StaticProfile::from_parts(
                "You are an architecture reviewer. Identify structural problems in module \
                 boundaries, dependencies and responsibilities.",
                &[
                    "Layering violations and circular dependencies",
                    "God objects and modules with mixed responsibilities",
                    "Leaky abstractions exposing implementation details",
                    "Hidden global state",
                ],
            ),
        ),
        (
            "testing",
            StaticProfile::from_parts(
                "You are a testing reviewer. Identify behaviour that is untested or tested in \
                 a way that would not catch regressions.",
                &[
                    "Public behaviour without tests",
                    "Error paths and edge cases that are never exercised",
                    "Tests that depend on timing, ordering or external services",
                    "Assertions that cannot fail",
                ],
            ),
        ),
    ]
}
