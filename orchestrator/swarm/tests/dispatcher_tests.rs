// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use swarm_review_core::application::ReviewExecutor;
use swarm_review_core::domain::config::SwarmConfigSpec;
use swarm_review_core::domain::events::MessageType;
use swarm_review_core::domain::finding::{FindingDraft, ReviewFinding, Severity};
use swarm_review_core::domain::profile::{ReviewerProfile, ReviewerRegistry};
use swarm_review_core::domain::repository::{StoreBackend, StoreError};
use swarm_review_core::domain::reviewer::{ReviewerResult, ReviewerStatus};
use swarm_review_core::domain::session::{ReviewTarget, SessionId, SwarmStatus};
use swarm_review_core::infrastructure::event_bus::EventBus;
use swarm_review_core::infrastructure::store::{CoordinationStore, InMemoryStoreBackend, DEFAULT_SESSION_TTL};
use swarm_review_swarm::application::{ResultAggregator, SwarmDispatcher};
use swarm_review_swarm::domain::{ReviewerProgressStatus, SwarmError};

#[derive(Clone)]
enum Behavior {
    Findings(Vec<(Severity, &'static str, u32)>),
    Panic,
    Sleep(Duration),
}

/// Executor whose outcome per reviewer type is fixed up front
struct ScriptedExecutor {
    behaviors: HashMap<String, Behavior>,
}

impl ScriptedExecutor {
    fn new(behaviors: Vec<(&str, Behavior)>) -> Arc<Self> {
        Arc::new(Self {
            behaviors: behaviors
                .into_iter()
                .map(|(name, behavior)| (name.to_string(), behavior))
                .collect(),
        })
    }
}

#[async_trait]
impl ReviewExecutor for ScriptedExecutor {
    async fn execute_review(
        &self,
        _session_id: &SessionId,
        target: &ReviewTarget,
        reviewer_type: &str,
        _profile: Arc<dyn ReviewerProfile>,
    ) -> ReviewerResult {
        let behavior = self
            .behaviors
            .get(reviewer_type)
            .cloned()
            .unwrap_or(Behavior::Findings(vec![]));
        match behavior {
            Behavior::Findings(items) => {
                let findings = items
                    .into_iter()
                    .map(|(severity, title, line)| {
                        ReviewFinding::new(
                            reviewer_type,
                            FindingDraft {
                                severity,
                                category: reviewer_type.to_string(),
                                title: title.to_string(),
                                description: "scripted".to_string(),
                                file_path: format!("{}/pool.py", target),
                                line_start: line,
                                line_end: None,
                                code_snippet: None,
                                recommendation: String::new(),
                                confidence: 0.8,
                            },
                        )
                    })
                    .collect();
                ReviewerResult::success(reviewer_type, findings, Duration::from_millis(5), vec![])
            }
            Behavior::Panic => panic!("{} reviewer exploded", reviewer_type),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                ReviewerResult::success(reviewer_type, vec![], duration, vec![])
            }
        }
    }
}

/// Backend that refuses to store unified reports
struct FailingReportBackend {
    inner: InMemoryStoreBackend,
}

#[async_trait]
impl StoreBackend for FailingReportBackend {
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        self.inner.hset_multiple(key, fields).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        if field == "unified_report" {
            return Err(StoreError::Backend("write rejected".to_string()));
        }
        self.inner.hset(key, field, value).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.inner.hget(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.inner.hgetall(key).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.sadd(key, member).await
    }

    async fn smembers(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        self.inner.smembers(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.inner.expire(key, ttl).await
    }
}

fn config() -> SwarmConfigSpec {
    let mut config = SwarmConfigSpec::default();
    config.dispatch.poll_interval_ms = 10;
    config.dispatch.default_timeout_seconds = 5;
    config
}

fn dispatcher_with(backend: Arc<dyn StoreBackend>, executor: Arc<ScriptedExecutor>) -> SwarmDispatcher {
    let store = CoordinationStore::new(backend, "swarm", DEFAULT_SESSION_TTL);
    SwarmDispatcher::new(
        store,
        Arc::new(ReviewerRegistry::with_builtin()),
        executor,
        &config(),
    )
}

fn types(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(|s| s.to_string()).collect())
}

#[tokio::test]
async fn test_panicking_reviewer_does_not_fail_swarm() {
    let executor = ScriptedExecutor::new(vec![
        ("security", Behavior::Panic),
        (
            "performance",
            Behavior::Findings(vec![(Severity::High, "Blocking call in worker loop", 12)]),
        ),
        (
            "style",
            Behavior::Findings(vec![(Severity::Low, "Function too long", 40)]),
        ),
    ]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);

    let session_id = dispatcher
        .dispatch("src/workers/", types(&["security", "performance", "style"]), None)
        .await
        .unwrap();
    let results = dispatcher.collect_results(&session_id, None).await.unwrap();

    assert_eq!(results.len(), 3);
    let security = &results["security"];
    assert_eq!(security.status, ReviewerStatus::Failed);
    assert!(security.error_message.as_deref().unwrap().contains("exploded"));
    assert_eq!(results["performance"].status, ReviewerStatus::Success);

    let session = dispatcher.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SwarmStatus::Aggregating);
}

#[tokio::test]
async fn test_run_swarm_end_to_end() {
    let executor = ScriptedExecutor::new(vec![
        ("security", Behavior::Panic),
        (
            "performance",
            Behavior::Findings(vec![(Severity::High, "Blocking call in worker loop", 12)]),
        ),
        (
            "style",
            Behavior::Findings(vec![(Severity::Low, "Function too long", 40)]),
        ),
    ]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);

    let report = dispatcher
        .run_swarm("src/workers/", types(&["security", "performance", "style"]), None)
        .await
        .unwrap();

    assert_eq!(report.reviewers_completed, vec!["performance", "style"]);
    assert_eq!(report.reviewers_failed, vec!["security"]);
    assert_eq!(report.total_findings, 2);
    assert_eq!(report.high.len(), 1);
    assert_eq!(report.low.len(), 1);

    let session = dispatcher.get_session(&report.session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SwarmStatus::Complete);
    assert!(session.completed_at.is_some());
    let stored = session.unified_report.unwrap();
    assert_eq!(stored.session_id, report.session_id);
    assert_eq!(stored.total_findings, report.total_findings);
    assert_eq!(stored.reviewers_failed, report.reviewers_failed);
}

#[tokio::test]
async fn test_unknown_reviewer_types_are_skipped() {
    let executor = ScriptedExecutor::new(vec![]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);

    let report = dispatcher
        .run_swarm("./src", types(&["style", "astrology"]), None)
        .await
        .unwrap();

    assert_eq!(report.reviewers_completed, vec!["style"]);
    assert!(report.reviewers_failed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_reviewer_becomes_timeout_result() {
    let executor = ScriptedExecutor::new(vec![
        ("security", Behavior::Findings(vec![])),
        ("style", Behavior::Sleep(Duration::from_secs(600))),
    ]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);

    let session_id = dispatcher
        .dispatch("./src", types(&["security", "style"]), Some(2))
        .await
        .unwrap();
    let partial = dispatcher.collect_results(&session_id, None).await.unwrap();
    assert_eq!(partial.len(), 1);
    assert!(partial.contains_key("security"));

    let report = dispatcher
        .run_swarm("./src", types(&["security", "style"]), Some(2))
        .await
        .unwrap();
    assert_eq!(report.reviewers_completed, vec!["security"]);
    assert_eq!(report.reviewers_failed, vec!["style"]);
}

#[tokio::test]
async fn test_transition_out_of_terminal_state_is_rejected() {
    let executor = ScriptedExecutor::new(vec![]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);

    let report = dispatcher.run_swarm("./src", types(&["style"]), None).await.unwrap();

    let err = dispatcher
        .collect_results(&report.session_id, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SwarmError::InvalidTransition {
            from: SwarmStatus::Complete,
            to: SwarmStatus::Aggregating,
            ..
        }
    ));

    let err = dispatcher.fail_swarm(&report.session_id, "late").await.unwrap_err();
    assert!(matches!(err, SwarmError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_finalize_on_terminal_session_leaves_report_untouched() {
    let executor = ScriptedExecutor::new(vec![]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);

    let session_id = dispatcher.dispatch("./src", types(&["style"]), None).await.unwrap();
    dispatcher.fail_swarm(&session_id, "aborted").await.unwrap();

    let report = ResultAggregator::default().aggregate(
        &dispatcher.get_session(&session_id).await.unwrap().unwrap(),
        &BTreeMap::new(),
    );
    let err = dispatcher.finalize_swarm(&session_id, &report).await.unwrap_err();
    assert!(matches!(
        err,
        SwarmError::InvalidTransition {
            from: SwarmStatus::Failed,
            to: SwarmStatus::Complete,
            ..
        }
    ));

    let session = dispatcher.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SwarmStatus::Failed);
    assert!(session.unified_report.is_none());
}

#[tokio::test]
async fn test_finalize_failure_marks_session_failed() {
    let backend = Arc::new(FailingReportBackend {
        inner: InMemoryStoreBackend::new(),
    });
    let executor = ScriptedExecutor::new(vec![]);
    let dispatcher = dispatcher_with(backend, executor);
    let bus = Arc::new(EventBus::with_default_capacity());
    let dispatcher = dispatcher.with_publisher(bus.clone());
    let mut events = bus.subscribe();

    let err = dispatcher
        .run_swarm("./src", types(&["style"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SwarmError::Store(_)));

    let started = events.recv().await.unwrap();
    assert_eq!(started.message_type, MessageType::Started);
    let session_id = SessionId::from(started.subject.trim_start_matches("swarm/"));

    let session = dispatcher.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SwarmStatus::Failed);
    assert!(session.unified_report.is_none());

    let mut seen = Vec::new();
    while let Ok(message) = events.try_recv() {
        seen.push(message.message_type);
    }
    assert!(seen.contains(&MessageType::Failed));
    assert!(!seen.contains(&MessageType::Complete));
}

#[tokio::test]
async fn test_session_status_reports_per_reviewer_progress() {
    let executor = ScriptedExecutor::new(vec![
        ("security", Behavior::Findings(vec![(Severity::Critical, "Hardcoded credential", 3)])),
        ("style", Behavior::Sleep(Duration::from_secs(30))),
    ]);
    let dispatcher = dispatcher_with(Arc::new(InMemoryStoreBackend::new()), executor);
    let session_id = dispatcher
        .dispatch("./src", types(&["security", "style"]), None)
        .await
        .unwrap();

    let store = dispatcher.sessions().store().clone();
    let done = store
        .wait_for_completion(
            &session_id,
            &["security".to_string()],
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await;
    assert!(done);

    let view = dispatcher.session_status(&session_id).await.unwrap();
    assert_eq!(view.status, SwarmStatus::InProgress);
    assert_eq!(view.reviewers["security"].status, ReviewerProgressStatus::Success);
    assert_eq!(view.reviewers["security"].findings_count, 1);
    assert_eq!(view.reviewers["security"].progress_percent, 100);
    assert_eq!(view.reviewers["style"].status, ReviewerProgressStatus::Running);
    assert_eq!(view.reviewers["style"].progress_percent, 0);

    let missing = dispatcher.session_status(&SessionId::from("ffffffffffff")).await;
    assert!(matches!(missing, Err(SwarmError::SessionNotFound(_))));
}
