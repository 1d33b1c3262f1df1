// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Reviewer Results
//!
//! A [`ReviewerResult`] is the single outcome of one reviewer's unit of work in
//! one session. It is produced exactly once, stored, and never mutated.
//!
//! ## Invariants
//!
//! - `status` is one of `success`, `failed`, `timeout`.
//! - `failed` and `timeout` results always carry a non-empty `error_message`.
//!   The constructors enforce this; deserialized values are repaired by
//!   [`ReviewerResult::normalized`].

use crate::domain::finding::ReviewFinding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerStatus {
    Success,
    Failed,
    Timeout,
}

impl ReviewerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewerStatus::Success => "success",
            ReviewerStatus::Failed => "failed",
            ReviewerStatus::Timeout => "timeout",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReviewerStatus::Success)
    }
}

impl fmt::Display for ReviewerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerResult {
    pub reviewer_type: String,
    pub status: ReviewerStatus,
    #[serde(default)]
    pub findings: Vec<ReviewFinding>,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub files_reviewed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ReviewerResult {
    pub fn success(
        reviewer_type: impl Into<String>,
        findings: Vec<ReviewFinding>,
        duration: Duration,
        files_reviewed: Vec<String>,
    ) -> Self {
        Self {
            reviewer_type: reviewer_type.into(),
            status: ReviewerStatus::Success,
            findings,
            duration_seconds: duration.as_secs_f64(),
            files_reviewed,
            error_message: None,
        }
    }

    pub fn failed(reviewer_type: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            reviewer_type: reviewer_type.into(),
            status: ReviewerStatus::Failed,
            findings: Vec::new(),
            duration_seconds: duration.as_secs_f64(),
            files_reviewed: Vec::new(),
            error_message: Some(non_empty(error.into(), "reviewer failed")),
        }
    }

    pub fn timeout(reviewer_type: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            reviewer_type: reviewer_type.into(),
            status: ReviewerStatus::Timeout,
            findings: Vec::new(),
            duration_seconds: duration.as_secs_f64(),
            files_reviewed: Vec::new(),
            error_message: Some(non_empty(error.into(), "reviewer timed out")),
        }
    }

    pub fn findings_count(&self) -> usize {
        self.findings.len()
    }

    /// Re-establish the error-message invariant on a value read from storage.
    pub fn normalized(mut self) -> Self {
        if !self.status.is_success() {
            let fallback = match self.status {
                ReviewerStatus::Timeout => "reviewer timed out",
                _ => "reviewer failed",
            };
            self.error_message = Some(non_empty(self.error_message.take().unwrap_or_default(), fallback));
        }
        self
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_always_has_message() {
        let result = ReviewerResult::failed("security", "", Duration::from_millis(5));
        assert_eq!(result.status, ReviewerStatus::Failed);
        assert_eq!(result.error_message.as_deref(), Some("reviewer failed"));

        let result = ReviewerResult::timeout("style", "  ", Duration::ZERO);
        assert_eq!(result.error_message.as_deref(), Some("reviewer timed out"));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&ReviewerStatus::Timeout).unwrap(), "\"timeout\"");
        let parsed: ReviewerStatus = serde_json::from_str("\"success\"").unwrap();
        assert!(parsed.is_success());
    }

    #[test]
    fn test_normalized_repairs_missing_message() {
        let json = r#"{"reviewer_type":"style","status":"failed","findings":[],"duration_seconds":1.0,"files_reviewed":[]}"#;
        let result: ReviewerResult = serde_json::from_str(json).unwrap();
        assert!(result.error_message.is_none());
        assert_eq!(result.normalized().error_message.as_deref(), Some("reviewer failed"));
    }

    #[test]
    fn test_success_has_no_error() {
        let result = ReviewerResult::success("style", vec![], Duration::from_secs(2), vec!["a.rs".into()]);
        assert!(result.error_message.is_none());
        assert_eq!(result.duration_seconds, 2.0);
        assert_eq!(result.findings_count(), 0);
    }
}
