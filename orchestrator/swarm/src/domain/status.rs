// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session Status View
//!
//! Read model served by the status endpoint: the session's state plus one
//! progress entry per requested reviewer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_review_core::domain::report::UnifiedReport;
use swarm_review_core::domain::reviewer::ReviewerStatus;
use swarm_review_core::domain::session::{SessionId, SwarmSession, SwarmStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerProgressStatus {
    Pending,
    Running,
    Success,
    Failed,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerProgress {
    pub status: ReviewerProgressStatus,
    pub findings_count: usize,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub status: SwarmStatus,
    pub reviewers: BTreeMap<String, ReviewerProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_report: Option<UnifiedReport>,
}

impl SessionStatusView {
    /// Completed reviewers report 100%; the rest report 0% and are `running`
    /// while the session is in flight, `pending` otherwise.
    pub fn from_session(session: SwarmSession) -> Self {
        let in_flight = matches!(session.status, SwarmStatus::InProgress | SwarmStatus::Aggregating);

        let reviewers = session
            .reviewer_types
            .iter()
            .map(|reviewer_type| {
                let progress = match session.results.get(reviewer_type) {
                    Some(result) => ReviewerProgress {
                        status: match result.status {
                            ReviewerStatus::Success => ReviewerProgressStatus::Success,
                            ReviewerStatus::Failed => ReviewerProgressStatus::Failed,
                            ReviewerStatus::Timeout => ReviewerProgressStatus::Timeout,
                        },
                        findings_count: result.findings_count(),
                        progress_percent: 100,
                    },
                    None => ReviewerProgress {
                        status: if in_flight {
                            ReviewerProgressStatus::Running
                        } else {
                            ReviewerProgressStatus::Pending
                        },
                        findings_count: 0,
                        progress_percent: 0,
                    },
                };
                (reviewer_type.clone(), progress)
            })
            .collect();

        Self {
            session_id: session.session_id,
            status: session.status,
            reviewers,
            unified_report: session.unified_report,
        }
    }
}
