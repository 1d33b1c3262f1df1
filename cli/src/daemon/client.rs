// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with daemon API

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use swarm_review_swarm::domain::SessionStatusView;
use swarm_review_swarm::presentation::api::CreateReviewResponse;

use super::base_url;

#[derive(Debug, Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateReviewRequest<'a> {
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewer_types: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
}

impl DaemonClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url(host, port),
        })
    }

    pub async fn submit_review(
        &self,
        target: &str,
        reviewer_types: Option<&[String]>,
        timeout: Option<u64>,
    ) -> Result<CreateReviewResponse> {
        let response = self
            .client
            .post(format!("{}/api/reviews", self.base_url))
            .json(&CreateReviewRequest {
                target,
                reviewer_types,
                timeout,
            })
            .send()
            .await
            .context("Failed to submit review")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to submit review: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse submit response")
    }

    pub async fn review_status(&self, session_id: &str) -> Result<SessionStatusView> {
        let response = self
            .client
            .get(format!("{}/api/reviews/{}", self.base_url, session_id))
            .send()
            .await
            .context("Failed to get review status")?;

        if response.status() == StatusCode::NOT_FOUND {
            anyhow::bail!("Session not found: {}", session_id);
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to get review status: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse status response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use swarm_review_core::domain::session::SwarmStatus;

    fn client_for(server: &mockito::Server) -> DaemonClient {
        let address = server.host_with_port();
        let (host, port) = address.rsplit_once(':').unwrap();
        DaemonClient::new(host, port.parse().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_submit_review() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/reviews")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "target": "./src",
                "reviewer_types": ["security"]
            })))
            .with_status(202)
            .with_body(r#"{"session_id":"a1b2c3d4e5f6","status":"pending","poll_url":"/api/reviews/a1b2c3d4e5f6"}"#)
            .create_async()
            .await;

        let reviewers = vec!["security".to_string()];
        let created = client_for(&server)
            .submit_review("./src", Some(&reviewers), None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.session_id.as_str(), "a1b2c3d4e5f6");
        assert_eq!(created.poll_url, "/api/reviews/a1b2c3d4e5f6");
    }

    #[tokio::test]
    async fn test_review_status() {
        let mut server = mockito::Server::new_async().await;
        let _found = server
            .mock("GET", "/api/reviews/a1b2c3d4e5f6")
            .with_status(200)
            .with_body(
                r#"{"session_id":"a1b2c3d4e5f6","status":"in_progress","reviewers":{
                    "security":{"status":"success","findings_count":2,"progress_percent":100},
                    "style":{"status":"running","findings_count":0,"progress_percent":0}}}"#,
            )
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/api/reviews/000000000000")
            .with_status(404)
            .with_body(r#"{"error":"Session not found: 000000000000"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let view = client.review_status("a1b2c3d4e5f6").await.unwrap();
        assert_eq!(view.status, SwarmStatus::InProgress);
        assert_eq!(view.reviewers["security"].findings_count, 2);
        assert!(view.unified_report.is_none());

        let err = client.review_status("000000000000").await.unwrap_err();
        assert!(err.to_string().contains("Session not found"));
    }
}
