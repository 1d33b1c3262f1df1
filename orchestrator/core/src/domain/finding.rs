// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Review Findings
//!
//! A [`ReviewFinding`] is one discrete issue reported by a reviewer. Findings are
//! immutable value objects: the aggregator never edits a finding in place, it
//! builds a new one with [`ReviewFinding::merge_group`].
//!
//! Severity is a closed, ordered set (`CRITICAL > HIGH > MEDIUM > LOW > INFO`).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Separator used when several reviewers corroborate the same finding.
pub const REVIEWER_SEPARATOR: &str = ",";

/// Ordered severity scale. `Ord` follows the scale, so `Critical` is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first. Report buckets follow this order.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            "INFO" => Ok(Severity::Info),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// One issue reported by a reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFinding {
    pub id: String,
    /// Producing reviewer. Merged findings list every contributor, comma separated.
    pub reviewer_type: String,
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub line_start: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default)]
    pub recommendation: String,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f64,
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_confidence(raw))
}

/// Clamp a confidence into `[0, 1]`. NaN collapses to `0.0`.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Required and optional parts of a finding, before an id is assigned.
#[derive(Debug, Clone)]
pub struct FindingDraft {
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: Option<u32>,
    pub code_snippet: Option<String>,
    pub recommendation: String,
    pub confidence: f64,
}

impl ReviewFinding {
    /// Build a finding for `reviewer_type` with a fresh id.
    pub fn new(reviewer_type: impl Into<String>, draft: FindingDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reviewer_type: reviewer_type.into(),
            severity: draft.severity,
            category: draft.category,
            title: draft.title,
            description: draft.description,
            file_path: draft.file_path,
            line_start: draft.line_start,
            line_end: draft.line_end,
            code_snippet: draft.code_snippet,
            recommendation: draft.recommendation,
            confidence: clamp_confidence(draft.confidence),
        }
    }

    /// Reviewer types that contributed to this finding, in first-seen order.
    pub fn contributors(&self) -> impl Iterator<Item = &str> {
        self.reviewer_type
            .split(REVIEWER_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The first contributor. Post-merge counts credit a finding to this reviewer.
    pub fn primary_reviewer(&self) -> &str {
        self.contributors().next().unwrap_or("")
    }

    /// Merge a group of duplicate findings into a new finding.
    ///
    /// The most severe member is the base (earliest wins ties), contributors are
    /// concatenated without repeats and confidence is the group maximum. Returns
    /// `None` for an empty group.
    pub fn merge_group(group: &[ReviewFinding]) -> Option<ReviewFinding> {
        let mut base = group.first()?;
        for candidate in group.iter().skip(1) {
            if candidate.severity > base.severity {
                base = candidate;
            }
        }

        let mut contributors: Vec<&str> = Vec::new();
        for finding in group {
            for reviewer in finding.contributors() {
                if !contributors.contains(&reviewer) {
                    contributors.push(reviewer);
                }
            }
        }

        let confidence = group
            .iter()
            .map(|f| f.confidence)
            .fold(0.0_f64, f64::max);

        let mut merged = base.clone();
        merged.reviewer_type = contributors.join(REVIEWER_SEPARATOR);
        merged.confidence = clamp_confidence(confidence);
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(reviewer: &str, severity: Severity, title: &str, confidence: f64) -> ReviewFinding {
        ReviewFinding::new(
            reviewer,
            FindingDraft {
                severity,
                category: "security".to_string(),
                title: title.to_string(),
                description: "desc".to_string(),
                file_path: "src/test.py".to_string(),
                line_start: 10,
                line_end: None,
                code_snippet: None,
                recommendation: String::new(),
                confidence,
            },
        )
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert_eq!(Severity::ALL[0], Severity::Critical);
    }

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!("high".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" Critical ".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(finding("security", Severity::Low, "t", 1.7).confidence, 1.0);
        assert_eq!(finding("security", Severity::Low, "t", -0.2).confidence, 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_deserialize_clamps_confidence() {
        let json = r#"{
            "id": "a", "reviewer_type": "style", "severity": "LOW", "category": "naming",
            "title": "t", "description": "d", "file_path": "a.rs", "line_start": 3,
            "recommendation": "", "confidence": 4.0
        }"#;
        let parsed: ReviewFinding = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.confidence, 1.0);
        assert_eq!(parsed.severity, Severity::Low);
    }

    #[test]
    fn test_merge_group_takes_highest_severity_and_all_contributors() {
        let a = finding("security", Severity::Medium, "SQL injection", 0.6);
        let b = finding("performance", Severity::Critical, "SQL injection found", 0.9);
        let c = finding("security", Severity::Low, "SQL injection again", 0.95);

        let merged = ReviewFinding::merge_group(&[a.clone(), b.clone(), c]).unwrap();

        assert_eq!(merged.severity, Severity::Critical);
        assert_eq!(merged.title, "SQL injection found");
        assert_eq!(merged.reviewer_type, "security,performance");
        assert_eq!(merged.primary_reviewer(), "security");
        assert_eq!(merged.confidence, 0.95);

        // Inputs are untouched
        assert_eq!(a.reviewer_type, "security");
        assert_eq!(b.reviewer_type, "performance");
    }

    #[test]
    fn test_merge_empty_group() {
        assert!(ReviewFinding::merge_group(&[]).is_none());
    }
}
