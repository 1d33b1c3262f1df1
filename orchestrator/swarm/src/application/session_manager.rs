// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session Manager
//!
//! Creates sessions and proxies status writes to the coordination store.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Session identity and lookups; `SessionNotFound` is raised here

use crate::domain::SwarmError;
use chrono::{DateTime, Utc};
use swarm_review_core::domain::session::{SessionId, SwarmSession, SwarmStatus};
use swarm_review_core::infrastructure::store::CoordinationStore;
use tracing::info;

#[derive(Clone)]
pub struct SessionManager {
    store: CoordinationStore,
    default_reviewers: Vec<String>,
}

impl SessionManager {
    pub fn new(store: CoordinationStore, default_reviewers: Vec<String>) -> Self {
        Self {
            store,
            default_reviewers,
        }
    }

    pub fn store(&self) -> &CoordinationStore {
        &self.store
    }

    pub fn default_reviewers(&self) -> &[String] {
        &self.default_reviewers
    }

    /// Create and persist a PENDING session. An empty or omitted reviewer
    /// list falls back to the configured defaults.
    pub async fn create_session(
        &self,
        target: &str,
        reviewer_types: Option<Vec<String>>,
        timeout_seconds: Option<u64>,
    ) -> Result<SwarmSession, SwarmError> {
        let reviewer_types = reviewer_types
            .filter(|types| !types.is_empty())
            .unwrap_or_else(|| self.default_reviewers.clone());

        let session = SwarmSession::new(target, reviewer_types, timeout_seconds);
        self.store.create_session(&session).await?;

        info!(
            session_id = %session.session_id,
            target = %session.target,
            reviewers = ?session.reviewer_types,
            "Created swarm session"
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &SessionId) -> Result<Option<SwarmSession>, SwarmError> {
        Ok(self.store.get_session(session_id).await?)
    }

    pub async fn require_session(&self, session_id: &SessionId) -> Result<SwarmSession, SwarmError> {
        self.get_session(session_id)
            .await?
            .ok_or_else(|| SwarmError::SessionNotFound(session_id.clone()))
    }

    /// Overwrite the status (and optionally the completion time)
    pub async fn update_status(
        &self,
        session_id: &SessionId,
        status: SwarmStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), SwarmError> {
        self.store
            .update_session_status(session_id, status, completed_at)
            .await?;
        Ok(())
    }
}
