// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Review Executor
//!
//! One reviewer's unit of work: extract code, ask the model, parse findings.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Produce exactly one `ReviewerResult` per call
//! - **Integration:** Dispatcher → ReviewExecutor → (CodeExtractor, LLMProvider)
//!
//! `execute_review` does not return errors. Extraction, analysis and parse
//! failures all come back as `failed` results carrying the reason.

use crate::application::response_parser::parse_findings;
use crate::domain::config::AnalysisConfig;
use crate::domain::llm::{GenerationOptions, LLMProvider};
use crate::domain::profile::ReviewerProfile;
use crate::domain::reviewer::ReviewerResult;
use crate::domain::session::{ReviewTarget, SessionId};
use crate::infrastructure::extraction::{CodeExtractor, ExtractedCode};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[async_trait]
pub trait ReviewExecutor: Send + Sync {
    async fn execute_review(
        &self,
        session_id: &SessionId,
        target: &ReviewTarget,
        reviewer_type: &str,
        profile: Arc<dyn ReviewerProfile>,
    ) -> ReviewerResult;
}

const RESPONSE_CONTRACT: &str = r#"Respond with a JSON array only. Each element must have:
  "severity": one of "CRITICAL", "HIGH", "MEDIUM", "LOW", "INFO"
  "category": short category name
  "title": one-line summary
  "description": what is wrong and why it matters
  "file_path": path exactly as shown in the file headers below
  "line_start": line number where the issue starts
  "line_end": optional line number where it ends
  "code_snippet": optional offending code
  "recommendation": how to fix it
  "confidence": number between 0 and 1
Return [] when there is nothing to report."#;

/// Render the full prompt for one reviewer over the extracted files
pub fn build_prompt(reviewer_type: &str, profile: &dyn ReviewerProfile, code: &ExtractedCode) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{}", profile.prompt().trim());
    let _ = writeln!(prompt);

    if !profile.checklist().is_empty() {
        let _ = writeln!(prompt, "## {} checklist", reviewer_type);
        for item in profile.checklist() {
            let _ = writeln!(prompt, "- {}", item);
        }
        let _ = writeln!(prompt);
    }

    let _ = writeln!(prompt, "## Response format");
    let _ = writeln!(prompt, "{}", RESPONSE_CONTRACT);
    let _ = writeln!(prompt);

    let _ = writeln!(
        prompt,
        "## Code ({} files, {} lines)",
        code.files.len(),
        code.total_lines
    );
    for file in &code.files {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "### File: {}", file.path);
        let width = file.line_count.max(1).to_string().len();
        for (number, line) in file.content.lines().enumerate() {
            let _ = writeln!(prompt, "{:>width$} | {}", number + 1, line, width = width);
        }
    }
    prompt
}

/// Executor backed by a code extractor and an LLM
pub struct LlmReviewExecutor {
    extractor: CodeExtractor,
    llm: Arc<dyn LLMProvider>,
    options: GenerationOptions,
}

impl LlmReviewExecutor {
    pub fn new(extractor: CodeExtractor, llm: Arc<dyn LLMProvider>, analysis: &AnalysisConfig) -> Self {
        Self {
            extractor,
            llm,
            options: GenerationOptions {
                max_tokens: Some(analysis.max_tokens),
                temperature: Some(analysis.temperature),
                stop_sequences: None,
            },
        }
    }
}

#[async_trait]
impl ReviewExecutor for LlmReviewExecutor {
    async fn execute_review(
        &self,
        session_id: &SessionId,
        target: &ReviewTarget,
        reviewer_type: &str,
        profile: Arc<dyn ReviewerProfile>,
    ) -> ReviewerResult {
        let started = Instant::now();
        info!(session_id = %session_id, reviewer_type = %reviewer_type, target = %target, "Starting review");

        let code = match self.extractor.extract(target).await {
            Ok(code) => code,
            Err(e) => {
                warn!(session_id = %session_id, reviewer_type = %reviewer_type, error = %e, "Extraction failed");
                return ReviewerResult::failed(reviewer_type, format!("Extraction failed: {}", e), started.elapsed());
            }
        };

        let prompt = build_prompt(reviewer_type, profile.as_ref(), &code);
        let response = match self.llm.generate(&prompt, &self.options).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session_id = %session_id, reviewer_type = %reviewer_type, error = %e, "Analysis failed");
                return ReviewerResult::failed(reviewer_type, format!("Analysis failed: {}", e), started.elapsed());
            }
        };

        let findings = parse_findings(reviewer_type, &response.text);
        info!(
            session_id = %session_id,
            reviewer_type = %reviewer_type,
            provider = %response.provider,
            model = %response.model,
            tokens = response.usage.total_tokens,
            findings = findings.len(),
            files = code.files.len(),
            "Review complete"
        );

        ReviewerResult::success(reviewer_type, findings, started.elapsed(), code.paths())
    }
}
