// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Coordination Messages
//!
//! Lifecycle notifications emitted by the dispatcher. Delivery is delegated to
//! an injected [`CoordinationPublisher`]; the default publisher drops
//! everything. Delivery is best effort: publishers never fail the caller.
//!
//! Subjects are `swarm/{session_id}` for session events and
//! `swarm/{session_id}/{reviewer_type}` for reviewer events.

use crate::domain::session::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Started,
    ReviewerComplete,
    Complete,
    Failed,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Started => "started",
            MessageType::ReviewerComplete => "reviewer_complete",
            MessageType::Complete => "complete",
            MessageType::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationMessage {
    pub message_type: MessageType,
    pub subject: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

impl CoordinationMessage {
    /// Whether this message concerns `session_id`.
    pub fn concerns(&self, session_id: &SessionId) -> bool {
        let session_subject = session_subject(session_id);
        self.subject == session_subject
            || self
                .subject
                .strip_prefix(session_subject.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

pub fn session_subject(session_id: &SessionId) -> String {
    format!("swarm/{}", session_id)
}

pub fn reviewer_subject(session_id: &SessionId, reviewer_type: &str) -> String {
    format!("swarm/{}/{}", session_id, reviewer_type)
}

/// Outbound port for coordination messages.
#[async_trait]
pub trait CoordinationPublisher: Send + Sync {
    async fn publish(&self, message_type: MessageType, subject: &str, description: &str);
}

/// Publisher that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl CoordinationPublisher for NoopPublisher {
    async fn publish(&self, _message_type: MessageType, _subject: &str, _description: &str) {}
}
