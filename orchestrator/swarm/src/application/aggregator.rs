// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Result Aggregator
//!
//! Merges per-reviewer results into one [`UnifiedReport`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Flatten → deduplicate → bucket → count
//!
//! # Duplicates
//!
//! Two findings are duplicates when they name the same file, their
//! `line_start` values are at most `line_tolerance` apart, and their
//! lower-cased titles have a Ratcliff/Obershelp ratio of at least
//! `title_similarity_threshold`. A finding joins the first earlier group whose
//! first member it duplicates.
//!
//! All counts in the report are taken after merging.

use crate::application::similarity::title_similarity;
use chrono::Utc;
use std::collections::BTreeMap;
use swarm_review_core::domain::config::AggregationConfig;
use swarm_review_core::domain::finding::{ReviewFinding, Severity};
use swarm_review_core::domain::report::UnifiedReport;
use swarm_review_core::domain::reviewer::ReviewerResult;
use swarm_review_core::domain::session::SwarmSession;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ResultAggregator {
    line_tolerance: u32,
    title_similarity_threshold: f64,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::from(&AggregationConfig::default())
    }
}

impl From<&AggregationConfig> for ResultAggregator {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            line_tolerance: config.line_tolerance,
            title_similarity_threshold: config.title_similarity_threshold,
        }
    }
}

impl ResultAggregator {
    pub fn new(line_tolerance: u32, title_similarity_threshold: f64) -> Self {
        Self {
            line_tolerance,
            title_similarity_threshold,
        }
    }

    /// Same file, lines within `line_tolerance`, and title similarity at or
    /// above the threshold (inclusive, so a threshold of 1.0 means identical
    /// titles).
    pub fn is_duplicate(&self, a: &ReviewFinding, b: &ReviewFinding) -> bool {
        a.file_path == b.file_path
            && a.line_start.abs_diff(b.line_start) <= self.line_tolerance
            && title_similarity(&a.title, &b.title) >= self.title_similarity_threshold
    }

    /// Group duplicates and merge each group; returns the merged findings in
    /// first-seen order and the number of findings removed.
    pub fn deduplicate(&self, findings: Vec<ReviewFinding>) -> (Vec<ReviewFinding>, usize) {
        let mut groups: Vec<Vec<ReviewFinding>> = Vec::new();
        for finding in findings {
            match groups
                .iter_mut()
                .find(|group| self.is_duplicate(&group[0], &finding))
            {
                Some(group) => group.push(finding),
                None => groups.push(vec![finding]),
            }
        }

        let mut removed = 0;
        let merged = groups
            .iter()
            .filter_map(|group| {
                removed += group.len() - 1;
                ReviewFinding::merge_group(group)
            })
            .collect();
        (merged, removed)
    }

    pub fn aggregate(
        &self,
        session: &SwarmSession,
        results: &BTreeMap<String, ReviewerResult>,
    ) -> UnifiedReport {
        // BTreeMap iteration gives reviewer_type order
        let flattened: Vec<ReviewFinding> = results
            .iter()
            .flat_map(|(reviewer_type, result)| {
                result.findings.iter().map(move |finding| {
                    let mut tagged = finding.clone();
                    tagged.reviewer_type = reviewer_type.clone();
                    tagged
                })
            })
            .collect();
        let raw_count = flattened.len();

        let (merged, duplicates_removed) = self.deduplicate(flattened);
        debug!(
            session_id = %session.session_id,
            raw = raw_count,
            merged = merged.len(),
            duplicates_removed,
            "Deduplicated findings"
        );
        metrics::counter!("swarm_duplicates_removed_total").increment(duplicates_removed as u64);

        let mut findings_by_reviewer: BTreeMap<String, usize> = BTreeMap::new();
        let mut findings_by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut buckets: BTreeMap<Severity, Vec<ReviewFinding>> = BTreeMap::new();

        for finding in merged {
            *findings_by_reviewer
                .entry(finding.primary_reviewer().to_string())
                .or_default() += 1;
            *findings_by_category.entry(finding.category.clone()).or_default() += 1;
            buckets.entry(finding.severity).or_default().push(finding);
        }

        for bucket in buckets.values_mut() {
            bucket.sort_by(|a, b| {
                (a.file_path.as_str(), a.line_start, a.title.as_str())
                    .cmp(&(b.file_path.as_str(), b.line_start, b.title.as_str()))
            });
        }
        let mut take = |severity: Severity| buckets.remove(&severity).unwrap_or_default();

        let reviewers_completed: Vec<String> = results
            .iter()
            .filter(|(_, result)| result.status.is_success())
            .map(|(reviewer_type, _)| reviewer_type.clone())
            .collect();
        let reviewers_failed: Vec<String> = results
            .iter()
            .filter(|(_, result)| !result.status.is_success())
            .map(|(reviewer_type, _)| reviewer_type.clone())
            .collect();

        let critical = take(Severity::Critical);
        let high = take(Severity::High);
        let medium = take(Severity::Medium);
        let low = take(Severity::Low);
        let info = take(Severity::Info);
        let total_findings = critical.len() + high.len() + medium.len() + low.len() + info.len();

        UnifiedReport {
            session_id: session.session_id.clone(),
            target: session.target.clone(),
            critical,
            high,
            medium,
            low,
            info,
            total_findings,
            reviewers_completed,
            reviewers_failed,
            findings_by_reviewer,
            findings_by_category,
            duplicates_removed,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use swarm_review_core::domain::finding::FindingDraft;

    fn finding(
        reviewer: &str,
        severity: Severity,
        category: &str,
        title: &str,
        file: &str,
        line: u32,
        confidence: f64,
    ) -> ReviewFinding {
        ReviewFinding::new(
            reviewer,
            FindingDraft {
                severity,
                category: category.to_string(),
                title: title.to_string(),
                description: format!("{} details", title),
                file_path: file.to_string(),
                line_start: line,
                line_end: None,
                code_snippet: None,
                recommendation: String::new(),
                confidence,
            },
        )
    }

    fn session(types: &[&str]) -> SwarmSession {
        SwarmSession::new("src/", types.iter().map(|s| s.to_string()).collect(), None)
    }

    fn success(reviewer: &str, findings: Vec<ReviewFinding>) -> ReviewerResult {
        ReviewerResult::success(reviewer, findings, Duration::from_secs(1), vec![])
    }

    #[test]
    fn test_sql_injection_duplicates_merge() {
        let mut results = BTreeMap::new();
        results.insert(
            "security".to_string(),
            success(
                "security",
                vec![finding(
                    "security",
                    Severity::Critical,
                    "injection",
                    "SQL Injection vulnerability in query",
                    "src/test.py",
                    10,
                    0.9,
                )],
            ),
        );
        results.insert(
            "style".to_string(),
            success(
                "style",
                vec![finding(
                    "style",
                    Severity::Medium,
                    "quality",
                    "SQL Injection vulnerability found",
                    "src/test.py",
                    10,
                    0.95,
                )],
            ),
        );

        let report = ResultAggregator::default().aggregate(&session(&["security", "style"]), &results);
        assert_eq!(report.total_findings, 1);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.critical.len(), 1);

        let merged = &report.critical[0];
        assert_eq!(merged.reviewer_type, "security,style");
        assert_eq!(merged.title, "SQL Injection vulnerability in query");
        assert_eq!(merged.category, "injection");
        assert_eq!(merged.confidence, 0.95);
        assert_eq!(report.reviewers_completed, vec!["security", "style"]);
    }

    #[test]
    fn test_counts_are_post_merge() {
        let mut results = BTreeMap::new();
        results.insert(
            "performance".to_string(),
            success(
                "performance",
                vec![
                    finding("performance", Severity::High, "database", "N+1 query in loop", "app/views.py", 40, 0.8),
                    finding("performance", Severity::Low, "memory", "Unbounded cache", "app/cache.py", 5, 0.6),
                ],
            ),
        );
        results.insert(
            "security".to_string(),
            success(
                "security",
                vec![finding("security", Severity::Medium, "database", "N+1 query in a loop", "app/views.py", 42, 0.7)],
            ),
        );

        let report = ResultAggregator::default().aggregate(&session(&["performance", "security"]), &results);
        assert_eq!(report.total_findings, 2);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.findings_by_reviewer.get("performance"), Some(&2));
        assert_eq!(report.findings_by_reviewer.get("security"), None);
        assert_eq!(report.findings_by_category.get("database"), Some(&1));
        assert_eq!(report.findings_by_category.get("memory"), Some(&1));
        assert_eq!(report.findings_by_reviewer.values().sum::<usize>(), report.total_findings);
        assert_eq!(report.findings_by_category.values().sum::<usize>(), report.total_findings);
        let bucketed: usize = report.severity_counts().iter().map(|(_, n)| n).sum();
        assert_eq!(bucketed, report.total_findings);
    }

    #[test]
    fn test_similarity_threshold_is_inclusive() {
        // "abcd" vs "abce": 2 * 3 / 8 = 0.75 exactly
        let a = finding("security", Severity::Low, "x", "abcd", "a.py", 1, 0.5);
        let b = finding("style", Severity::Low, "x", "abce", "a.py", 1, 0.5);

        assert!(ResultAggregator::new(0, 0.75).is_duplicate(&a, &b));
        assert!(!ResultAggregator::new(0, 0.76).is_duplicate(&a, &b));
    }

    #[test]
    fn test_line_tolerance_and_file_separate_findings() {
        let aggregator = ResultAggregator::default();
        let base = finding("security", Severity::High, "x", "Hardcoded secret", "a.py", 10, 0.5);
        let near = finding("style", Severity::High, "x", "Hardcoded secret", "a.py", 13, 0.5);
        let far = finding("style", Severity::High, "x", "Hardcoded secret", "a.py", 14, 0.5);
        let other_file = finding("style", Severity::High, "x", "Hardcoded secret", "b.py", 10, 0.5);
        let different_title = finding("style", Severity::High, "x", "Missing index", "a.py", 10, 0.5);

        assert!(aggregator.is_duplicate(&base, &near));
        assert!(!aggregator.is_duplicate(&base, &far));
        assert!(!aggregator.is_duplicate(&base, &other_file));
        assert!(!aggregator.is_duplicate(&base, &different_title));
    }

    #[test]
    fn test_buckets_sorted_and_failures_listed() {
        let mut results = BTreeMap::new();
        results.insert(
            "style".to_string(),
            success(
                "style",
                vec![
                    finding("style", Severity::Low, "naming", "Zeta name", "b.rs", 1, 0.5),
                    finding("style", Severity::Low, "naming", "Long function", "a.rs", 30, 0.5),
                    finding("style", Severity::Low, "naming", "Alpha name", "a.rs", 30, 0.5),
                    finding("style", Severity::Low, "naming", "Unused import", "a.rs", 2, 0.5),
                ],
            ),
        );
        results.insert(
            "security".to_string(),
            ReviewerResult::failed("security", "model unavailable", Duration::from_secs(2)),
        );
        results.insert(
            "architecture".to_string(),
            ReviewerResult::timeout("architecture", "no result", Duration::from_secs(300)),
        );

        let report = ResultAggregator::default()
            .aggregate(&session(&["style", "security", "architecture"]), &results);
        let order: Vec<(&str, u32, &str)> = report
            .low
            .iter()
            .map(|f| (f.file_path.as_str(), f.line_start, f.title.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.rs", 2, "Unused import"),
                ("a.rs", 30, "Alpha name"),
                ("a.rs", 30, "Long function"),
                ("b.rs", 1, "Zeta name"),
            ]
        );
        assert_eq!(report.reviewers_completed, vec!["style"]);
        assert_eq!(report.reviewers_failed, vec!["architecture", "security"]);
    }

    #[test]
    fn test_empty_results() {
        let report = ResultAggregator::default().aggregate(&session(&["style"]), &BTreeMap::new());
        assert_eq!(report.total_findings, 0);
        assert!(report.reviewers_completed.is_empty());
        assert!(report.findings_by_reviewer.is_empty());
    }
}
