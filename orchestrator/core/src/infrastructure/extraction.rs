// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Code Extraction
//!
//! Collects the source files a reviewer unit analyzes, from a local path or a
//! GitHub repository, under shared limits.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn a `ReviewTarget` into bounded, line-counted source text
//! - **Integration:** `ReviewTarget` → `ExtractedCode` → prompt
//!
//! # Limits
//!
//! - **Extensions**: only allow-listed extensions are read
//! - **File size**: larger files are skipped and recorded
//! - **Line ceiling**: accumulation stops at the first file that would push
//!   the running total past `max_total_lines`

use crate::domain::config::ExtractionConfig;
use crate::domain::session::ReviewTarget;
use crate::infrastructure::github::GitHubClient;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    ".venv",
    "dist",
    "build",
    "vendor",
];

#[derive(Debug, Clone)]
pub struct ExtractionLimits {
    pub allowed_extensions: BTreeSet<String>,
    pub max_file_bytes: u64,
    pub max_total_lines: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for ExtractionLimits {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_bytes: config.max_file_bytes,
            max_total_lines: config.max_total_lines,
        }
    }
}

impl ExtractionLimits {
    pub fn is_allowed(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.allowed_extensions.contains(&ext.to_ascii_lowercase()))
    }
}

/// Whether any directory component of a relative path is excluded or hidden
pub fn in_excluded_dir(path: &str) -> bool {
    let mut components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    components.pop();
    components
        .iter()
        .any(|c| c.starts_with('.') || EXCLUDED_DIRS.contains(c))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Files gathered for one review, in visit order
#[derive(Debug, Clone, Default)]
pub struct ExtractedCode {
    pub files: Vec<SourceFile>,
    pub total_lines: usize,
    pub skipped: Vec<SkippedFile>,
    /// Per-file failures that did not stop extraction
    pub errors: Vec<String>,
    /// Set when the line ceiling stopped accumulation
    pub truncated: bool,
}

impl ExtractedCode {
    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub(crate) fn skip(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        let path = path.into();
        let reason = reason.into();
        debug!(path = %path, reason = %reason, "Skipping file");
        self.skipped.push(SkippedFile { path, reason });
    }

    /// Add a file unless it would push the total past `max_total_lines`.
    ///
    /// Returns `false` once the ceiling is reached; callers stop offering files.
    pub(crate) fn offer(&mut self, path: String, content: String, limits: &ExtractionLimits) -> bool {
        let line_count = content.lines().count();
        if self.total_lines + line_count > limits.max_total_lines {
            info!(
                path = %path,
                total_lines = self.total_lines,
                max_total_lines = limits.max_total_lines,
                "Line ceiling reached, stopping extraction"
            );
            self.truncated = true;
            return false;
        }
        self.total_lines += line_count;
        self.files.push(SourceFile {
            path,
            content,
            line_count,
        });
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    #[error("Remote fetch failed: {0}")]
    Remote(String),

    #[error("No reviewable files found in {0}")]
    NoReviewableFiles(String),
}

/// Reads local paths and remote repositories under one set of limits
#[derive(Clone)]
pub struct CodeExtractor {
    limits: ExtractionLimits,
    github: GitHubClient,
}

impl CodeExtractor {
    pub fn new(limits: ExtractionLimits, github: GitHubClient) -> Self {
        Self { limits, github }
    }

    pub fn limits(&self) -> &ExtractionLimits {
        &self.limits
    }

    /// Extract reviewable code; an empty result is an error
    pub async fn extract(&self, target: &ReviewTarget) -> Result<ExtractedCode, ExtractionError> {
        let extracted = match target {
            ReviewTarget::LocalPath(path) => extract_local(path, &self.limits)?,
            ReviewTarget::Repository { url } => self.github.extract(url, &self.limits).await?,
        };

        if extracted.is_empty() {
            return Err(ExtractionError::NoReviewableFiles(target.to_string()));
        }

        info!(
            target = %target,
            files = extracted.files.len(),
            total_lines = extracted.total_lines,
            skipped = extracted.skipped.len(),
            "Extracted code for review"
        );
        Ok(extracted)
    }
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || EXCLUDED_DIRS.contains(&name))
}

/// Read a single file or walk a directory in sorted order
pub fn extract_local(root: &Path, limits: &ExtractionLimits) -> Result<ExtractedCode, ExtractionError> {
    if !root.exists() {
        return Err(ExtractionError::NotFound(root.to_path_buf()));
    }

    let mut extracted = ExtractedCode::default();

    if root.is_file() {
        let display = root.display().to_string();
        if limits.is_allowed(&display) {
            read_local_file(root, display, limits, &mut extracted);
        } else {
            extracted.skip(display, "unsupported extension");
        }
        return Ok(extracted);
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry");
                extracted.errors.push(e.to_string());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if !limits.is_allowed(&relative) {
            continue;
        }
        if !read_local_file(entry.path(), relative, limits, &mut extracted) {
            break;
        }
    }

    Ok(extracted)
}

/// Returns `false` once the line ceiling stops accumulation
fn read_local_file(path: &Path, display: String, limits: &ExtractionLimits, extracted: &mut ExtractedCode) -> bool {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            extracted.errors.push(format!("{}: {}", display, e));
            return true;
        }
    };
    if size > limits.max_file_bytes {
        extracted.skip(
            display,
            format!("{} bytes exceeds limit of {} bytes", size, limits.max_file_bytes),
        );
        return true;
    }

    match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(content) => extracted.offer(display, content, limits),
            Err(_) => {
                extracted.skip(display, "not valid UTF-8");
                true
            }
        },
        Err(e) => {
            extracted.errors.push(format!("{}: {}", display, e));
            true
        }
    }
}
