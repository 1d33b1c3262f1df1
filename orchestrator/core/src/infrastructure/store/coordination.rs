// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Coordination Store
//!
//! Session records, per-reviewer results and completion signals, laid out
//! over a [`StoreBackend`]:
//!
//! | Key | Type | Contents |
//! |-----|------|----------|
//! | `{prefix}:session:{id}` | hash | session fields; lists and reports as JSON |
//! | `{prefix}:results:{id}` | hash | reviewer_type → JSON `ReviewerResult` |
//! | `{prefix}:progress:{id}` | set | reviewer types that have completed |
//!
//! All three keys share one TTL, set when the session is created and
//! refreshed on every result write.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Shared substrate reviewer units and the dispatcher
//!   communicate through

use crate::domain::report::UnifiedReport;
use crate::domain::repository::{StoreBackend, StoreError};
use crate::domain::reviewer::ReviewerResult;
use crate::domain::session::{SessionId, SwarmSession, SwarmStatus};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const FIELD_SESSION_ID: &str = "session_id";
const FIELD_TARGET: &str = "target";
const FIELD_REVIEWER_TYPES: &str = "reviewer_types";
const FIELD_STATUS: &str = "status";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_COMPLETED_AT: &str = "completed_at";
const FIELD_TIMEOUT_SECONDS: &str = "timeout_seconds";
const FIELD_UNIFIED_REPORT: &str = "unified_report";

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct CoordinationStore {
    backend: Arc<dyn StoreBackend>,
    prefix: String,
    ttl: Duration,
}

impl CoordinationStore {
    pub fn new(backend: Arc<dyn StoreBackend>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn session_key(&self, session_id: &SessionId) -> String {
        format!("{}:session:{}", self.prefix, session_id)
    }

    pub fn results_key(&self, session_id: &SessionId) -> String {
        format!("{}:results:{}", self.prefix, session_id)
    }

    pub fn progress_key(&self, session_id: &SessionId) -> String {
        format!("{}:progress:{}", self.prefix, session_id)
    }

    /// Persist a new session record and start its lifetime
    pub async fn create_session(&self, session: &SwarmSession) -> Result<(), StoreError> {
        let key = self.session_key(&session.session_id);
        let mut fields = vec![
            (FIELD_SESSION_ID.to_string(), session.session_id.to_string()),
            (FIELD_TARGET.to_string(), session.target.clone()),
            (
                FIELD_REVIEWER_TYPES.to_string(),
                serde_json::to_string(&session.reviewer_types)?,
            ),
            (FIELD_STATUS.to_string(), session.status.as_str().to_string()),
            (FIELD_CREATED_AT.to_string(), session.created_at.to_rfc3339()),
        ];
        if let Some(completed_at) = session.completed_at {
            fields.push((FIELD_COMPLETED_AT.to_string(), completed_at.to_rfc3339()));
        }
        if let Some(timeout) = session.timeout_seconds {
            fields.push((FIELD_TIMEOUT_SECONDS.to_string(), timeout.to_string()));
        }
        if let Some(report) = &session.unified_report {
            fields.push((FIELD_UNIFIED_REPORT.to_string(), serde_json::to_string(report)?));
        }

        self.backend.hset_multiple(&key, &fields).await?;
        self.backend.expire(&key, self.ttl).await?;
        debug!(session_id = %session.session_id, key = %key, "Created session record");
        Ok(())
    }

    /// Load a session; `None` when the record does not exist or has expired
    pub async fn get_session(&self, session_id: &SessionId) -> Result<Option<SwarmSession>, StoreError> {
        let key = self.session_key(session_id);
        let fields = self.backend.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let mut session = session_from_fields(&key, session_id, &fields)?;
        session.results = self.get_completed_results(session_id).await?;
        Ok(Some(session))
    }

    /// Overwrite the status field, plus `completed_at` when given
    pub async fn update_session_status(
        &self,
        session_id: &SessionId,
        status: SwarmStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut fields = vec![(FIELD_STATUS.to_string(), status.as_str().to_string())];
        if let Some(completed_at) = completed_at {
            fields.push((FIELD_COMPLETED_AT.to_string(), completed_at.to_rfc3339()));
        }
        self.backend
            .hset_multiple(&self.session_key(session_id), &fields)
            .await
    }

    pub async fn store_unified_report(
        &self,
        session_id: &SessionId,
        report: &UnifiedReport,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(report)?;
        self.backend
            .hset(&self.session_key(session_id), FIELD_UNIFIED_REPORT, &encoded)
            .await
    }

    /// Record one reviewer's outcome and signal its completion.
    ///
    /// The result field is written before the progress member is added, so a
    /// reader that sees the signal can always read the result. A second call
    /// for the same reviewer overwrites the field.
    pub async fn store_reviewer_result(
        &self,
        session_id: &SessionId,
        reviewer_type: &str,
        result: &ReviewerResult,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(result)?;
        let results_key = self.results_key(session_id);
        let progress_key = self.progress_key(session_id);

        self.backend.hset(&results_key, reviewer_type, &encoded).await?;
        self.backend.sadd(&progress_key, reviewer_type).await?;

        for key in [self.session_key(session_id), results_key, progress_key] {
            self.backend.expire(&key, self.ttl).await?;
        }
        Ok(())
    }

    /// Every stored result, signalled or not. Undecodable entries are skipped.
    pub async fn get_all_results(
        &self,
        session_id: &SessionId,
    ) -> Result<BTreeMap<String, ReviewerResult>, StoreError> {
        let key = self.results_key(session_id);
        let raw = self.backend.hgetall(&key).await?;
        let mut results = BTreeMap::new();
        for (reviewer_type, encoded) in raw {
            match serde_json::from_str::<ReviewerResult>(&encoded) {
                Ok(result) => {
                    results.insert(reviewer_type, result.normalized());
                }
                Err(e) => warn!(
                    session_id = %session_id,
                    reviewer_type = %reviewer_type,
                    error = %e,
                    "Skipping undecodable reviewer result"
                ),
            }
        }
        Ok(results)
    }

    pub async fn get_reviewer_result(
        &self,
        session_id: &SessionId,
        reviewer_type: &str,
    ) -> Result<Option<ReviewerResult>, StoreError> {
        let key = self.results_key(session_id);
        match self.backend.hget(&key, reviewer_type).await? {
            Some(encoded) => {
                let result: ReviewerResult =
                    serde_json::from_str(&encoded).map_err(|e| StoreError::Corrupt {
                        key: format!("{}#{}", key, reviewer_type),
                        reason: e.to_string(),
                    })?;
                Ok(Some(result.normalized()))
            }
            None => Ok(None),
        }
    }

    pub async fn get_completed_types(&self, session_id: &SessionId) -> Result<BTreeSet<String>, StoreError> {
        let members = self.backend.smembers(&self.progress_key(session_id)).await?;
        Ok(members.into_iter().collect())
    }

    /// Results whose reviewer has signalled completion.
    ///
    /// A result present in the results hash but absent from the progress set
    /// is not complete yet.
    pub async fn get_completed_results(
        &self,
        session_id: &SessionId,
    ) -> Result<BTreeMap<String, ReviewerResult>, StoreError> {
        let completed = self.get_completed_types(session_id).await?;
        if completed.is_empty() {
            return Ok(BTreeMap::new());
        }
        let mut results = self.get_all_results(session_id).await?;
        results.retain(|reviewer_type, _| completed.contains(reviewer_type));
        Ok(results)
    }

    /// Poll the progress set until it covers `expected` or `timeout` elapses.
    ///
    /// Returns whether every expected reviewer signalled. Read failures are
    /// logged and polling continues.
    pub async fn wait_for_completion(
        &self,
        session_id: &SessionId,
        expected: &[String],
        timeout: Duration,
        poll_interval: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let progress_key = self.progress_key(session_id);

        loop {
            match self.backend.smembers(&progress_key).await {
                Ok(done) => {
                    if expected.iter().all(|reviewer_type| done.contains(reviewer_type)) {
                        return true;
                    }
                    debug!(
                        session_id = %session_id,
                        completed = done.len(),
                        expected = expected.len(),
                        "Waiting for reviewers"
                    );
                }
                Err(e) => warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to read progress; continuing to poll"
                ),
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }
}

fn required<'a>(key: &str, fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, StoreError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("missing field '{}'", name),
        })
}

fn parse_timestamp(key: &str, name: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("invalid {}: {}", name, e),
        })
}

fn session_from_fields(
    key: &str,
    session_id: &SessionId,
    fields: &HashMap<String, String>,
) -> Result<SwarmSession, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: key.to_string(),
        reason,
    };

    let status = required(key, fields, FIELD_STATUS)?
        .parse::<SwarmStatus>()
        .map_err(|e| corrupt(e.to_string()))?;
    let reviewer_types: Vec<String> = serde_json::from_str(required(key, fields, FIELD_REVIEWER_TYPES)?)
        .map_err(|e| corrupt(format!("invalid reviewer_types: {}", e)))?;
    let created_at = parse_timestamp(key, FIELD_CREATED_AT, required(key, fields, FIELD_CREATED_AT)?)?;
    let completed_at = fields
        .get(FIELD_COMPLETED_AT)
        .map(|raw| parse_timestamp(key, FIELD_COMPLETED_AT, raw))
        .transpose()?;
    let timeout_seconds = fields
        .get(FIELD_TIMEOUT_SECONDS)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|e| corrupt(format!("invalid timeout_seconds: {}", e)))
        })
        .transpose()?;
    let unified_report = fields
        .get(FIELD_UNIFIED_REPORT)
        .map(|raw| {
            serde_json::from_str::<UnifiedReport>(raw)
                .map_err(|e| corrupt(format!("invalid unified_report: {}", e)))
        })
        .transpose()?;

    Ok(SwarmSession {
        session_id: session_id.clone(),
        target: required(key, fields, FIELD_TARGET)?.to_string(),
        reviewer_types,
        status,
        created_at,
        completed_at,
        timeout_seconds,
        results: BTreeMap::new(),
        unified_report,
    })
}
