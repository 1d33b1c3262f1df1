// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Store Backend
//!
//! Process-local implementation of [`StoreBackend`] for single-node
//! deployments and tests.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Hash/set storage with per-key expiry
//! - **Pattern:** Adapter (Hexagonal Architecture)
//!
//! Expired keys are removed lazily, the next time any operation touches
//! them. Deadlines use `tokio::time::Instant`, so paused test clocks apply.

use crate::domain::repository::{StoreBackend, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
enum Value {
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStoreBackend {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryStoreBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time to live of `key`, if it exists and has one
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock();
        let entry = entries.get(key).filter(|entry| !entry.is_expired(now))?;
        entry.expires_at.map(|deadline| deadline.saturating_duration_since(now))
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    if entries
        .get(key)
        .is_some_and(|entry| entry.is_expired(Instant::now()))
    {
        entries.remove(key);
    }
}

fn hash_mut<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
) -> Result<&'a mut HashMap<String, String>, StoreError> {
    purge_expired(entries, key);
    let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
        value: Value::Hash(HashMap::new()),
        expires_at: None,
    });
    match &mut entry.value {
        Value::Hash(hash) => Ok(hash),
        Value::Set(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

#[async_trait]
impl StoreBackend for InMemoryStoreBackend {
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let hash = hash_mut(&mut entries, key)?;
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        hash_mut(&mut entries, key)?.insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries, key);
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(Value::Set(_)) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries, key);
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(Value::Set(_)) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries, key);
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            Value::Hash(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn smembers(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries, key);
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(HashSet::new()),
            Some(Value::Set(set)) => Ok(set.clone()),
            Some(Value::Hash(_)) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries, key);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_roundtrip() {
        let backend = InMemoryStoreBackend::new();
        backend
            .hset_multiple(
                "swarm:session:1",
                &[
                    ("status".to_string(), "pending".to_string()),
                    ("target".to_string(), "./src".to_string()),
                ],
            )
            .await
            .unwrap();
        backend.hset("swarm:session:1", "status", "in_progress").await.unwrap();

        let all = backend.hgetall("swarm:session:1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            backend.hget("swarm:session:1", "status").await.unwrap().as_deref(),
            Some("in_progress")
        );
        assert!(backend.hget("swarm:session:1", "missing").await.unwrap().is_none());
        assert!(backend.hgetall("swarm:session:2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_add_reports_novelty() {
        let backend = InMemoryStoreBackend::new();
        assert!(backend.sadd("swarm:progress:1", "security").await.unwrap());
        assert!(!backend.sadd("swarm:progress:1", "security").await.unwrap());
        assert!(backend.sadd("swarm:progress:1", "style").await.unwrap());
        assert_eq!(backend.smembers("swarm:progress:1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let backend = InMemoryStoreBackend::new();
        backend.sadd("k", "m").await.unwrap();
        assert!(matches!(
            backend.hset("k", "f", "v").await,
            Err(StoreError::WrongType(_))
        ));
        assert!(matches!(backend.hgetall("k").await, Err(StoreError::WrongType(_))));
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let backend = InMemoryStoreBackend::new();
        assert!(!backend.expire("absent", Duration::from_secs(5)).await.unwrap());
        assert!(backend.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_expire_lazily() {
        let backend = InMemoryStoreBackend::new();
        backend.hset("k", "f", "v").await.unwrap();
        assert!(backend.expire("k", Duration::from_secs(10)).await.unwrap());
        assert_eq!(backend.ttl("k"), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(backend.hget("k", "f").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(backend.hget("k", "f").await.unwrap().is_none());
        assert_eq!(backend.len(), 0);
    }
}
