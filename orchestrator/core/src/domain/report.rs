// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Unified Report
//!
//! The session-scoped aggregate produced once, when a swarm is finalized.
//! Findings are bucketed by severity; each bucket is ordered by
//! (`file_path`, `line_start`, `title`).

use crate::domain::finding::{ReviewFinding, Severity};
use crate::domain::session::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedReport {
    pub session_id: SessionId,
    pub target: String,
    pub critical: Vec<ReviewFinding>,
    pub high: Vec<ReviewFinding>,
    pub medium: Vec<ReviewFinding>,
    pub low: Vec<ReviewFinding>,
    pub info: Vec<ReviewFinding>,
    pub total_findings: usize,
    pub reviewers_completed: Vec<String>,
    pub reviewers_failed: Vec<String>,
    /// Post-merge counts, each finding credited to its primary reviewer.
    pub findings_by_reviewer: BTreeMap<String, usize>,
    /// Post-merge counts by category.
    pub findings_by_category: BTreeMap<String, usize>,
    pub duplicates_removed: usize,
    pub generated_at: DateTime<Utc>,
}

impl UnifiedReport {
    pub fn bucket(&self, severity: Severity) -> &[ReviewFinding] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.high,
            Severity::Medium => &self.medium,
            Severity::Low => &self.low,
            Severity::Info => &self.info,
        }
    }

    /// Severity counts, most severe first.
    pub fn severity_counts(&self) -> Vec<(Severity, usize)> {
        Severity::ALL
            .iter()
            .map(|severity| (*severity, self.bucket(*severity).len()))
            .collect()
    }

    /// All findings, most severe first.
    pub fn all_findings(&self) -> impl Iterator<Item = &ReviewFinding> {
        Severity::ALL.iter().flat_map(move |severity| self.bucket(*severity).iter())
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Swarm Review Report");
        let _ = writeln!(out);
        let _ = writeln!(out, "- **Session:** `{}`", self.session_id);
        let _ = writeln!(out, "- **Target:** `{}`", self.target);
        let _ = writeln!(out, "- **Total findings:** {}", self.total_findings);
        let _ = writeln!(out, "- **Duplicates merged:** {}", self.duplicates_removed);
        let _ = writeln!(
            out,
            "- **Reviewers completed:** {}",
            display_list(&self.reviewers_completed)
        );
        let _ = writeln!(out, "- **Reviewers failed:** {}", display_list(&self.reviewers_failed));
        let _ = writeln!(out);

        let _ = writeln!(out, "| Severity | Count |");
        let _ = writeln!(out, "|----------|-------|");
        for (severity, count) in self.severity_counts() {
            let _ = writeln!(out, "| {} | {} |", severity, count);
        }

        for severity in Severity::ALL {
            let bucket = self.bucket(severity);
            if bucket.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "## {}", severity);
            for finding in bucket {
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "### {} (`{}:{}`)",
                    finding.title, finding.file_path, finding.line_start
                );
                let _ = writeln!(
                    out,
                    "_{}_ · reported by {} · confidence {:.2}",
                    finding.category, finding.reviewer_type, finding.confidence
                );
                let _ = writeln!(out);
                let _ = writeln!(out, "{}", finding.description);
                if let Some(snippet) = &finding.code_snippet {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "```");
                    let _ = writeln!(out, "{}", snippet);
                    let _ = writeln!(out, "```");
                }
                if !finding.recommendation.is_empty() {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "**Recommendation:** {}", finding.recommendation);
                }
            }
        }

        out
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::finding::FindingDraft;

    fn report() -> UnifiedReport {
        let finding = ReviewFinding::new(
            "security,style",
            FindingDraft {
                severity: Severity::Critical,
                category: "injection".to_string(),
                title: "SQL Injection vulnerability in query".to_string(),
                description: "User input is concatenated into SQL.".to_string(),
                file_path: "src/test.py".to_string(),
                line_start: 10,
                line_end: None,
                code_snippet: Some("cursor.execute(q)".to_string()),
                recommendation: "Use parameterized queries".to_string(),
                confidence: 0.95,
            },
        );
        UnifiedReport {
            session_id: SessionId::from("a1b2c3d4e5f6"),
            target: "src/".to_string(),
            critical: vec![finding],
            high: vec![],
            medium: vec![],
            low: vec![],
            info: vec![],
            total_findings: 1,
            reviewers_completed: vec!["security".to_string(), "style".to_string()],
            reviewers_failed: vec![],
            findings_by_reviewer: BTreeMap::from([("security".to_string(), 1)]),
            findings_by_category: BTreeMap::from([("injection".to_string(), 1)]),
            duplicates_removed: 1,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_markdown_lists_only_populated_buckets() {
        let markdown = report().to_markdown();
        assert!(markdown.contains("- **Session:** `a1b2c3d4e5f6`"));
        assert!(markdown.contains("- **Reviewers failed:** none"));
        assert!(markdown.contains("| CRITICAL | 1 |"));
        assert!(markdown.contains("| INFO | 0 |"));
        assert!(markdown.contains("## CRITICAL"));
        assert!(!markdown.contains("## HIGH"));
        assert!(markdown.contains("### SQL Injection vulnerability in query (`src/test.py:10`)"));
        assert!(markdown.contains("reported by security,style · confidence 0.95"));
        assert!(markdown.contains("**Recommendation:** Use parameterized queries"));
    }

    #[test]
    fn test_all_findings_most_severe_first() {
        let mut report = report();
        let mut low = report.critical[0].clone();
        low.severity = Severity::Low;
        low.title = "Long line".to_string();
        report.low.push(low);

        let titles: Vec<&str> = report.all_findings().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["SQL Injection vulnerability in query", "Long line"]);
        assert_eq!(report.severity_counts()[0], (Severity::Critical, 1));
    }
}
