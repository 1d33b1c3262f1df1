// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Coordination Store Backend Interface
//!
//! The coordination store talks to a TTL-capable key/value service that offers
//! hashes and sets, the primitives a Redis-style server exposes. This module
//! defines that contract; `crate::infrastructure::store` implements the key
//! layout on top of it and ships an in-memory backend.
//!
//! | Primitive | Used for |
//! |-----------|----------|
//! | hash | session record, per-reviewer results |
//! | set | per-session completion signal |
//! | expire | shared session lifetime |
//!
//! ## Atomicity
//!
//! Each call is atomic on its own (`sadd` in particular), but there are no
//! multi-key transactions. Callers must tolerate a crash between two calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Storage backend selected at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
}

/// Hash/set primitives with per-key expiry.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Set several fields of a hash, creating it if needed
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Set one field of a hash, creating it if needed
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Read one field of a hash
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Read a whole hash; a missing key reads as empty
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Add a member to a set; returns whether it was newly added
    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Read all members of a set; a missing key reads as empty
    async fn smembers(&self, key: &str) -> Result<HashSet<String>, StoreError>;

    /// Set a key's time to live; returns false when the key does not exist
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Wrong type for key {0}")]
    WrongType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
