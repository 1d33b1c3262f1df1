// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Response Parser
//!
//! Turns free-form model output into validated findings.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Stage 3 of a review unit (extract → analyze → parse)
//!
//! Structured candidates are tried in order:
//!
//! 1. the whole response as JSON
//! 2. the body of each fenced code block
//! 3. the outermost balanced `[...]` / `{...}` span inside surrounding prose
//!
//! The first candidate that parses as JSON of an accepted shape (array of
//! findings, `{"findings": [...]}` or one finding object) wins. Each finding
//! in it is validated on its own; invalid ones are dropped. Only when nothing
//! parses does the free-text fallback scan for severity markers.

use crate::domain::finding::{clamp_confidence, FindingDraft, ReviewFinding, Severity};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_CONFIDENCE: f64 = 0.8;
pub const FALLBACK_CONFIDENCE: f64 = 0.3;
const UNKNOWN_FILE: &str = "unknown";

static FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("hardcoded regex pattern is valid")
});

static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:[-*>]|\d+\.)\s+|#+\s*)?(?:\[(critical|high|medium|low|info)\]|\*\*(critical|high|medium|low|info)\*\*|severity\s*:\s*\**(critical|high|medium|low|info)\**|(critical|high|medium|low|info)\s*:)\s*:?\s*(.*)$",
    )
    .expect("hardcoded regex pattern is valid")
});

static LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_./\\-]+\.[A-Za-z0-9]+):(\d+)").expect("hardcoded regex pattern is valid")
});

/// Parse a model response into findings attributed to `reviewer_type`.
///
/// Never fails; an unusable response yields an empty list.
pub fn parse_findings(reviewer_type: &str, response: &str) -> Vec<ReviewFinding> {
    let mut structured = false;
    for candidate in structured_candidates(response) {
        let Ok(value) = serde_json::from_str::<Value>(&candidate) else {
            continue;
        };
        let Some(items) = finding_objects(value) else {
            continue;
        };

        let total = items.len();
        let findings: Vec<ReviewFinding> = items
            .iter()
            .filter_map(|item| validate_finding(reviewer_type, item))
            .collect();
        if findings.len() < total {
            debug!(
                reviewer_type = %reviewer_type,
                dropped = total - findings.len(),
                "Dropped invalid finding candidates"
            );
        }
        structured = true;
        // A stray `[1]` in prose parses too; keep looking for real findings.
        if findings.is_empty() {
            continue;
        }
        return findings;
    }

    if structured {
        return Vec::new();
    }

    let findings = parse_free_text(reviewer_type, response);
    debug!(
        reviewer_type = %reviewer_type,
        count = findings.len(),
        "No structured findings; used free-text fallback"
    );
    findings
}

fn structured_candidates(response: &str) -> Vec<String> {
    let mut candidates = vec![response.trim().to_string()];
    candidates.extend(
        FENCE_REGEX
            .captures_iter(response)
            .filter_map(|caps| caps.get(1))
            .map(|body| body.as_str().trim().to_string())
            .filter(|body| !body.is_empty()),
    );
    candidates.extend(balanced_spans(response).into_iter().map(str::to_string));
    candidates
}

/// Every top-level balanced `[...]` or `{...}` span, in order, ignoring
/// brackets inside JSON string literals. An opener that never closes is
/// skipped and scanning resumes just after it.
pub(crate) fn balanced_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(['[', '{']) {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;

        for (i, &byte) in bytes.iter().enumerate().skip(start) {
            if in_string {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match byte {
                b'"' => in_string = true,
                b'[' | b'{' => depth += 1,
                b']' | b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        match end {
            Some(i) => {
                spans.push(&text[start..=i]);
                search_from = i + 1;
            }
            None => search_from = start + 1,
        }
    }
    spans
}

fn finding_objects(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("findings") {
            Some(Value::Array(items)) => Some(items),
            Some(_) => None,
            None => Some(vec![Value::Object(map)]),
        },
        _ => None,
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| map.get(*name))
        .and_then(Value::as_str)
        .map(str::trim)
}

fn line_field(map: &Map<String, Value>, names: &[&str]) -> Option<u32> {
    let value = names.iter().find_map(|name| map.get(*name))?;
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn validate_finding(reviewer_type: &str, value: &Value) -> Option<ReviewFinding> {
    let map = value.as_object()?;

    let severity: Severity = string_field(map, &["severity"])?.parse().ok()?;
    let title = string_field(map, &["title"]).filter(|t| !t.is_empty())?;
    let description = string_field(map, &["description"])?;
    let file_path = string_field(map, &["file_path", "file"]).filter(|p| !p.is_empty())?;
    let line_start = line_field(map, &["line_start", "line"])?;

    let confidence = map
        .get("confidence")
        .and_then(Value::as_f64)
        .map(clamp_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Some(ReviewFinding::new(
        reviewer_type,
        FindingDraft {
            severity,
            category: string_field(map, &["category"])
                .filter(|c| !c.is_empty())
                .unwrap_or(reviewer_type)
                .to_string(),
            title: title.to_string(),
            description: description.to_string(),
            file_path: file_path.to_string(),
            line_start,
            line_end: line_field(map, &["line_end"]),
            code_snippet: string_field(map, &["code_snippet", "snippet"])
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            recommendation: string_field(map, &["recommendation", "fix"])
                .unwrap_or_default()
                .to_string(),
            confidence,
        },
    ))
}

struct Section<'a> {
    severity: Severity,
    heading: &'a str,
    body: Vec<&'a str>,
}

fn marker(line: &str) -> Option<(Severity, &str)> {
    let caps = MARKER_REGEX.captures(line)?;
    let severity = (1..=4)
        .find_map(|i| caps.get(i))
        .and_then(|m| m.as_str().parse().ok())?;
    let rest = caps.get(5).map(|m| m.as_str()).unwrap_or_default();
    Some((severity, rest))
}

/// Derive one low-confidence finding per severity-marked section.
pub fn parse_free_text(reviewer_type: &str, response: &str) -> Vec<ReviewFinding> {
    let mut sections: Vec<Section<'_>> = Vec::new();
    for line in response.lines() {
        if let Some((severity, heading)) = marker(line) {
            sections.push(Section {
                severity,
                heading,
                body: Vec::new(),
            });
        } else if let Some(section) = sections.last_mut() {
            section.body.push(line);
        }
    }

    sections
        .into_iter()
        .filter_map(|section| {
            let body_lines: Vec<&str> = section
                .body
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect();

            let heading = section.heading.trim().trim_matches(|c: char| c == '*' || c == '-' || c == ':').trim();
            let title = if heading.is_empty() {
                body_lines.first().copied()?
            } else {
                heading
            };
            let description = if body_lines.is_empty() {
                title.to_string()
            } else {
                body_lines.join("\n")
            };

            let (file_path, line_start) = std::iter::once(section.heading)
                .chain(section.body.iter().copied())
                .find_map(|line| LOCATION_REGEX.captures(line))
                .and_then(|caps| {
                    let path = caps.get(1)?.as_str().to_string();
                    let line = caps.get(2)?.as_str().parse().ok()?;
                    Some((path, line))
                })
                .unwrap_or_else(|| (UNKNOWN_FILE.to_string(), 0));

            Some(ReviewFinding::new(
                reviewer_type,
                FindingDraft {
                    severity: section.severity,
                    category: reviewer_type.to_string(),
                    title: title.to_string(),
                    description,
                    file_path,
                    line_start,
                    line_end: None,
                    code_snippet: None,
                    recommendation: String::new(),
                    confidence: FALLBACK_CONFIDENCE,
                },
            ))
        })
        .collect()
}
