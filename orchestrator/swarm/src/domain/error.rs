// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Errors raised at the session manager and dispatcher boundary.

use swarm_review_core::domain::repository::StoreError;
use swarm_review_core::domain::session::{SessionId, SwarmStatus};

#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Invalid status transition for session {session_id}: {from} -> {to}")]
    InvalidTransition {
        session_id: SessionId,
        from: SwarmStatus,
        to: SwarmStatus,
    },

    #[error("Coordination store error: {0}")]
    Store(#[from] StoreError),

    #[error("Aggregation failed: {0}")]
    Aggregation(String),
}
