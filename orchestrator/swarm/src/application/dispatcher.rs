// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm Dispatcher
//!
//! Drives a session through its whole lifecycle:
//!
//! ```text
//! dispatch ──► collect_results ──► aggregate ──► finalize_swarm
//!    │               │                 │              │
//!    │               └─────── error ───┴──────────────┴──► fail_swarm
//!    └─► one detached task per reviewer, writing only to the store
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Fan-out of reviewer units, fan-in through the coordination
//!   store, status transitions and coordination messages
//!
//! Every status write is checked with [`SwarmStatus::can_transition_to`]
//! against the stored status first. Unit tasks are never joined; the
//! dispatcher only polls the store, so a unit that outlives the session
//! timeout is simply left out of the report.

use crate::application::aggregator::ResultAggregator;
use crate::application::session_manager::SessionManager;
use crate::domain::{SessionStatusView, SwarmError};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use swarm_review_core::application::ReviewExecutor;
use swarm_review_core::domain::config::SwarmConfigSpec;
use swarm_review_core::domain::events::{
    reviewer_subject, session_subject, CoordinationPublisher, MessageType, NoopPublisher,
};
use swarm_review_core::domain::profile::{ReviewerProfile, ReviewerRegistry};
use swarm_review_core::domain::report::UnifiedReport;
use swarm_review_core::domain::reviewer::ReviewerResult;
use swarm_review_core::domain::session::{SessionId, SwarmSession, SwarmStatus};
use swarm_review_core::infrastructure::store::CoordinationStore;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct SwarmDispatcher {
    sessions: SessionManager,
    registry: Arc<ReviewerRegistry>,
    executor: Arc<dyn ReviewExecutor>,
    aggregator: ResultAggregator,
    publisher: Arc<dyn CoordinationPublisher>,
    default_timeout: Duration,
    poll_interval: Duration,
}

impl SwarmDispatcher {
    pub fn new(
        store: CoordinationStore,
        registry: Arc<ReviewerRegistry>,
        executor: Arc<dyn ReviewExecutor>,
        config: &SwarmConfigSpec,
    ) -> Self {
        Self {
            sessions: SessionManager::new(store, config.dispatch.default_reviewers.clone()),
            registry,
            executor,
            aggregator: ResultAggregator::from(&config.aggregation),
            publisher: Arc::new(NoopPublisher),
            default_timeout: config.dispatch.default_timeout(),
            poll_interval: config.dispatch.poll_interval(),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn CoordinationPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn registry(&self) -> &ReviewerRegistry {
        &self.registry
    }

    pub async fn get_session(&self, session_id: &SessionId) -> Result<Option<SwarmSession>, SwarmError> {
        self.sessions.get_session(session_id).await
    }

    pub async fn session_status(&self, session_id: &SessionId) -> Result<SessionStatusView, SwarmError> {
        let session = self.sessions.require_session(session_id).await?;
        Ok(SessionStatusView::from_session(session))
    }

    /// Current status, if the session may move to `next` from it.
    async fn check_transition(&self, session_id: &SessionId, next: SwarmStatus) -> Result<SwarmStatus, SwarmError> {
        let session = self.sessions.require_session(session_id).await?;
        if !session.status.can_transition_to(next) {
            return Err(SwarmError::InvalidTransition {
                session_id: session_id.clone(),
                from: session.status,
                to: next,
            });
        }
        Ok(session.status)
    }

    async fn transition(&self, session_id: &SessionId, next: SwarmStatus) -> Result<(), SwarmError> {
        let from = self.check_transition(session_id, next).await?;
        let completed_at = next.is_terminal().then(Utc::now);
        self.sessions.update_status(session_id, next, completed_at).await?;
        debug!(session_id = %session_id, from = %from, to = %next, "Session transitioned");
        Ok(())
    }

    fn resolve(&self, requested: &[String]) -> Vec<(String, Arc<dyn ReviewerProfile>)> {
        let resolved = self.registry.resolve(requested);
        for reviewer_type in requested {
            if !self.registry.contains(reviewer_type) {
                debug!(reviewer_type = %reviewer_type, "Skipping unknown reviewer type");
            }
        }
        resolved
    }

    /// Create a session and launch one unit per known reviewer type.
    ///
    /// Returns as soon as the units are spawned.
    pub async fn dispatch(
        &self,
        target: &str,
        reviewer_types: Option<Vec<String>>,
        timeout_seconds: Option<u64>,
    ) -> Result<SessionId, SwarmError> {
        let session = self
            .sessions
            .create_session(target, reviewer_types, timeout_seconds)
            .await?;
        let session_id = session.session_id.clone();

        self.transition(&session_id, SwarmStatus::InProgress).await?;
        self.publisher
            .publish(
                MessageType::Started,
                &session_subject(&session_id),
                &format!(
                    "Reviewing {} with {}",
                    session.target,
                    session.reviewer_types.join(", ")
                ),
            )
            .await;

        let resolved = self.resolve(&session.reviewer_types);
        info!(
            session_id = %session_id,
            target = %session.target,
            reviewers = resolved.len(),
            "Dispatching reviewer units"
        );
        for (reviewer_type, profile) in resolved {
            self.spawn_unit(&session, reviewer_type, profile);
        }
        metrics::counter!("swarm_sessions_dispatched_total").increment(1);

        Ok(session_id)
    }

    fn spawn_unit(&self, session: &SwarmSession, reviewer_type: String, profile: Arc<dyn ReviewerProfile>) {
        let store = self.sessions.store().clone();
        let executor = self.executor.clone();
        let publisher = self.publisher.clone();
        let session_id = session.session_id.clone();
        let target = session.review_target();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(executor.execute_review(
                &session_id,
                &target,
                &reviewer_type,
                profile,
            ))
            .catch_unwind()
            .await;

            let result = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(
                        session_id = %session_id,
                        reviewer_type = %reviewer_type,
                        panic = %message,
                        "Reviewer unit panicked"
                    );
                    ReviewerResult::failed(
                        reviewer_type.as_str(),
                        format!("Reviewer panicked: {}", message),
                        started.elapsed(),
                    )
                }
            }
            .normalized();

            metrics::counter!("swarm_reviewer_results_total", "status" => result.status.as_str())
                .increment(1);

            if let Err(e) = store
                .store_reviewer_result(&session_id, &reviewer_type, &result)
                .await
            {
                error!(
                    session_id = %session_id,
                    reviewer_type = %reviewer_type,
                    error = %e,
                    "Failed to store reviewer result"
                );
            }

            publisher
                .publish(
                    MessageType::ReviewerComplete,
                    &reviewer_subject(&session_id, &reviewer_type),
                    &format!(
                        "{} finished with status {} ({} findings)",
                        reviewer_type,
                        result.status.as_str(),
                        result.findings_count()
                    ),
                )
                .await;
        });
    }

    fn effective_timeout(&self, session: &SwarmSession, timeout: Option<Duration>) -> Duration {
        timeout
            .or_else(|| session.timeout_seconds.map(Duration::from_secs))
            .unwrap_or(self.default_timeout)
    }

    /// Move the session to AGGREGATING and wait for its units.
    ///
    /// Returns whatever completed within the timeout; missing reviewers are
    /// not an error.
    pub async fn collect_results(
        &self,
        session_id: &SessionId,
        timeout: Option<Duration>,
    ) -> Result<BTreeMap<String, ReviewerResult>, SwarmError> {
        let session = self.sessions.require_session(session_id).await?;
        self.transition(session_id, SwarmStatus::Aggregating).await?;

        let expected: Vec<String> = self
            .resolve(&session.reviewer_types)
            .into_iter()
            .map(|(reviewer_type, _)| reviewer_type)
            .collect();
        let timeout = self.effective_timeout(&session, timeout);

        let all_done = self
            .sessions
            .store()
            .wait_for_completion(session_id, &expected, timeout, self.poll_interval)
            .await;
        let results = self.sessions.store().get_completed_results(session_id).await?;

        if all_done {
            info!(session_id = %session_id, results = results.len(), "All reviewers completed");
        } else {
            warn!(
                session_id = %session_id,
                completed = results.len(),
                expected = expected.len(),
                timeout_seconds = timeout.as_secs(),
                "Collection timed out; continuing with partial results"
            );
        }
        Ok(results)
    }

    pub async fn finalize_swarm(&self, session_id: &SessionId, report: &UnifiedReport) -> Result<(), SwarmError> {
        // A terminal session must not pick up a report.
        self.check_transition(session_id, SwarmStatus::Complete).await?;
        self.sessions
            .store()
            .store_unified_report(session_id, report)
            .await?;
        self.transition(session_id, SwarmStatus::Complete).await?;
        self.publisher
            .publish(
                MessageType::Complete,
                &session_subject(session_id),
                &format!(
                    "{} findings from {} reviewers",
                    report.total_findings,
                    report.reviewers_completed.len()
                ),
            )
            .await;
        metrics::counter!("swarm_sessions_finalized_total").increment(1);
        info!(session_id = %session_id, total_findings = report.total_findings, "Swarm complete");
        Ok(())
    }

    pub async fn fail_swarm(&self, session_id: &SessionId, reason: &str) -> Result<(), SwarmError> {
        self.transition(session_id, SwarmStatus::Failed).await?;
        self.publisher
            .publish(MessageType::Failed, &session_subject(session_id), reason)
            .await;
        metrics::counter!("swarm_sessions_failed_total").increment(1);
        warn!(session_id = %session_id, reason = %reason, "Swarm failed");
        Ok(())
    }

    /// Collect, aggregate and finalize an already dispatched session.
    async fn complete_swarm(&self, session_id: &SessionId, timeout: Option<Duration>) -> Result<UnifiedReport, SwarmError> {
        let mut results = self.collect_results(session_id, timeout).await?;
        let session = self.sessions.require_session(session_id).await?;
        let waited = self.effective_timeout(&session, timeout);

        for (reviewer_type, _) in self.resolve(&session.reviewer_types) {
            if !results.contains_key(&reviewer_type) {
                let result = ReviewerResult::timeout(
                    reviewer_type.as_str(),
                    format!("No result within {} seconds", waited.as_secs()),
                    waited,
                );
                results.insert(reviewer_type, result);
            }
        }

        let aggregator = &self.aggregator;
        let report = std::panic::catch_unwind(AssertUnwindSafe(|| aggregator.aggregate(&session, &results)))
            .map_err(|panic| SwarmError::Aggregation(panic_message(panic.as_ref())))?;

        self.finalize_swarm(session_id, &report).await?;
        Ok(report)
    }

    async fn complete_or_fail(&self, session_id: &SessionId, timeout: Option<Duration>) -> Result<UnifiedReport, SwarmError> {
        match self.complete_swarm(session_id, timeout).await {
            Ok(report) => Ok(report),
            Err(e) => {
                if let Err(fail_err) = self.fail_swarm(session_id, &e.to_string()).await {
                    error!(
                        session_id = %session_id,
                        error = %fail_err,
                        "Failed to mark swarm as failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Dispatch and wait for the unified report.
    pub async fn run_swarm(
        &self,
        target: &str,
        reviewer_types: Option<Vec<String>>,
        timeout_seconds: Option<u64>,
    ) -> Result<UnifiedReport, SwarmError> {
        let session_id = self.dispatch(target, reviewer_types, timeout_seconds).await?;
        self.complete_or_fail(&session_id, None).await
    }

    /// Dispatch and finish the session in the background.
    pub async fn start_swarm(
        &self,
        target: &str,
        reviewer_types: Option<Vec<String>>,
        timeout_seconds: Option<u64>,
    ) -> Result<SessionId, SwarmError> {
        let session_id = self.dispatch(target, reviewer_types, timeout_seconds).await?;

        let dispatcher = self.clone();
        let background_id = session_id.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.complete_or_fail(&background_id, None).await {
                error!(session_id = %background_id, error = %e, "Swarm did not complete");
            }
        });

        Ok(session_id)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
