// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Executor → coordination store, over a real directory tree.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use swarm_review_core::application::{LlmReviewExecutor, ReviewExecutor};
use swarm_review_core::domain::config::AnalysisConfig;
use swarm_review_core::domain::llm::{
    FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage,
};
use swarm_review_core::domain::profile::ReviewerRegistry;
use swarm_review_core::domain::reviewer::ReviewerStatus;
use swarm_review_core::domain::session::{SwarmSession, SwarmStatus};
use swarm_review_core::infrastructure::github::GitHubClient;
use swarm_review_core::infrastructure::store::DEFAULT_SESSION_TTL;
use swarm_review_core::infrastructure::{
    CodeExtractor, CoordinationStore, ExtractionLimits, InMemoryStoreBackend,
};

/// Answers every reviewer with one finding on the first extracted file.
struct EchoProvider;

#[async_trait]
impl LLMProvider for EchoProvider {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let path = prompt
            .lines()
            .find_map(|line| line.strip_prefix("### File: "))
            .unwrap_or("unknown")
            .to_string();
        let text = format!(
            "Here is what I found:\n{}\nThat is all.",
            serde_json::json!({"findings": [{
                "severity": "medium",
                "title": "Unbounded queue",
                "description": "Jobs are appended without a cap",
                "file": path,
                "line": 3,
            }]})
        );
        Ok(GenerationResponse {
            text,
            usage: TokenUsage::default(),
            provider: "echo".to_string(),
            model: "echo".to_string(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        Ok(())
    }
}

fn workers_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let workers = dir.path().join("src").join("workers");
    std::fs::create_dir_all(&workers).unwrap();
    std::fs::write(
        workers.join("queue.py"),
        "class Queue:\n    def push(self, job):\n        self.jobs.append(job)\n",
    )
    .unwrap();
    std::fs::write(workers.join("notes.txt"), "not reviewed\n").unwrap();
    dir
}

#[tokio::test]
async fn test_units_store_results_that_complete_the_session() {
    let tree = workers_tree();
    let target = tree.path().join("src").join("workers");

    let store = CoordinationStore::new(
        Arc::new(InMemoryStoreBackend::new()),
        "swarm",
        DEFAULT_SESSION_TTL,
    );
    let reviewers = vec![
        "security".to_string(),
        "performance".to_string(),
        "style".to_string(),
    ];
    let session = SwarmSession::new(target.display().to_string(), reviewers.clone(), None);
    store.create_session(&session).await.unwrap();

    let executor = LlmReviewExecutor::new(
        CodeExtractor::new(
            ExtractionLimits::default(),
            GitHubClient::new("http://127.0.0.1:9", None),
        ),
        Arc::new(EchoProvider),
        &AnalysisConfig::default(),
    );
    let registry = ReviewerRegistry::with_builtin();

    for (reviewer_type, profile) in registry.resolve(&reviewers) {
        let result = executor
            .execute_review(&session.session_id, &session.review_target(), &reviewer_type, profile)
            .await;
        store
            .store_reviewer_result(&session.session_id, &reviewer_type, &result)
            .await
            .unwrap();
    }

    assert!(
        store
            .wait_for_completion(
                &session.session_id,
                &reviewers,
                Duration::from_millis(50),
                Duration::from_millis(5),
            )
            .await
    );

    let results = store.get_completed_results(&session.session_id).await.unwrap();
    assert_eq!(results.len(), 3);
    for (reviewer_type, result) in &results {
        assert_eq!(result.status, ReviewerStatus::Success, "{}", reviewer_type);
        assert_eq!(result.files_reviewed, vec!["queue.py"]);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].file_path, "queue.py");
        assert_eq!(result.findings[0].line_start, 3);
    }

    let loaded = store.get_session(&session.session_id).await.unwrap().unwrap();
    assert_eq!(loaded.status, SwarmStatus::Pending);
    assert_eq!(loaded.results.len(), 3);
}
