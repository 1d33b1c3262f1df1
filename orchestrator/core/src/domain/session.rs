// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Sessions
//!
//! A [`SwarmSession`] is one review run spanning several reviewers over the same
//! [`ReviewTarget`]. Sessions are owned by the coordination store; everything
//! else reads and writes them through it.
//!
//! ## State Machine
//!
//! | From | To |
//! |------|----|
//! | `Pending` | `InProgress` |
//! | `InProgress` | `Aggregating`, `Failed` |
//! | `Aggregating` | `Complete`, `Failed` |
//!
//! Transitions only move forward; no state is entered twice.

use crate::domain::report::UnifiedReport;
use crate::domain::reviewer::ReviewerResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

const SESSION_ID_LEN: usize = 12;

/// Short session identifier derived from a random UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple.chars().take(SESSION_ID_LEN).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmStatus {
    Pending,
    InProgress,
    Aggregating,
    Complete,
    Failed,
}

impl SwarmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwarmStatus::Pending => "pending",
            SwarmStatus::InProgress => "in_progress",
            SwarmStatus::Aggregating => "aggregating",
            SwarmStatus::Complete => "complete",
            SwarmStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwarmStatus::Complete | SwarmStatus::Failed)
    }

    pub fn can_transition_to(&self, next: SwarmStatus) -> bool {
        matches!(
            (self, next),
            (SwarmStatus::Pending, SwarmStatus::InProgress)
                | (SwarmStatus::InProgress, SwarmStatus::Aggregating)
                | (SwarmStatus::InProgress, SwarmStatus::Failed)
                | (SwarmStatus::Aggregating, SwarmStatus::Complete)
                | (SwarmStatus::Aggregating, SwarmStatus::Failed)
        )
    }
}

impl fmt::Display for SwarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown swarm status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for SwarmStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SwarmStatus::Pending),
            "in_progress" => Ok(SwarmStatus::InProgress),
            "aggregating" => Ok(SwarmStatus::Aggregating),
            "complete" => Ok(SwarmStatus::Complete),
            "failed" => Ok(SwarmStatus::Failed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// What a swarm reviews: a path on the local filesystem or a remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewTarget {
    LocalPath(PathBuf),
    Repository { url: String },
}

impl ReviewTarget {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("github.com/")
        {
            ReviewTarget::Repository {
                url: trimmed.to_string(),
            }
        } else {
            ReviewTarget::LocalPath(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ReviewTarget::Repository { .. })
    }
}

impl fmt::Display for ReviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewTarget::LocalPath(path) => write!(f, "{}", path.display()),
            ReviewTarget::Repository { url } => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmSession {
    pub session_id: SessionId,
    pub target: String,
    pub reviewer_types: Vec<String>,
    pub status: SwarmStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Completed results keyed by reviewer type; partial while the swarm runs.
    #[serde(default)]
    pub results: BTreeMap<String, ReviewerResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_report: Option<UnifiedReport>,
}

impl SwarmSession {
    pub fn new(target: impl Into<String>, reviewer_types: Vec<String>, timeout_seconds: Option<u64>) -> Self {
        Self {
            session_id: SessionId::generate(),
            target: target.into(),
            reviewer_types,
            status: SwarmStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            timeout_seconds,
            results: BTreeMap::new(),
            unified_report: None,
        }
    }

    pub fn review_target(&self) -> ReviewTarget {
        ReviewTarget::parse(&self.target)
    }
}
