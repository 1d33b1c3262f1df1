// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! REST endpoints
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `POST` | `/api/reviews` | `202` with the new session id and its poll URL |
//! | `GET` | `/api/reviews/{id}` | session status with per-reviewer progress |
//! | `GET` | `/health` | liveness and uptime |

use crate::application::SwarmDispatcher;
use crate::domain::{SessionStatusView, SwarmError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use swarm_review_core::domain::session::SessionId;
use tracing::error;

pub struct AppState {
    pub dispatcher: SwarmDispatcher,
    pub start_time: Instant,
}

pub fn app(dispatcher: SwarmDispatcher) -> Router {
    let state = Arc::new(AppState {
        dispatcher,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/reviews", post(create_review_handler))
        .route("/api/reviews/{session_id}", get(review_status_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub target: String,
    #[serde(default)]
    pub reviewer_types: Option<Vec<String>>,
    /// Collection timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReviewResponse {
    pub session_id: SessionId,
    pub status: String,
    pub poll_url: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SwarmError> for ApiError {
    fn from(err: SwarmError) -> Self {
        let status = match err {
            SwarmError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            _ => {
                error!(error = %err, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn create_review_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<CreateReviewResponse>), ApiError> {
    let target = request.target.trim();
    if target.is_empty() {
        return Err(ApiError::bad_request("target must not be empty"));
    }

    if let Some(requested) = &request.reviewer_types {
        let registry = state.dispatcher.registry();
        let unknown: Vec<&str> = requested
            .iter()
            .map(String::as_str)
            .filter(|t| !registry.contains(t))
            .collect();
        if !unknown.is_empty() {
            return Err(ApiError::bad_request(format!(
                "unknown reviewer types: {} (available: {})",
                unknown.join(", "),
                registry.reviewer_types().join(", ")
            )));
        }
    }

    let session_id = state
        .dispatcher
        .start_swarm(target, request.reviewer_types, request.timeout)
        .await?;

    let poll_url = format!("/api/reviews/{}", session_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(CreateReviewResponse {
            session_id,
            status: "pending".to_string(),
            poll_url,
        }),
    ))
}

async fn review_status_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusView>, ApiError> {
    let view = state
        .dispatcher
        .session_status(&SessionId::from(session_id))
        .await?;
    Ok(Json(view))
}
