// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! GitHub Repository Fetcher
//!
//! Lists a repository's tree through the GitHub REST API and downloads the
//! reviewable blobs as raw content.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Remote half of code extraction
//! - **Integration:** `ReviewTarget::Repository` → `ExtractedCode`
//!
//! Requests:
//! - `GET {api}/repos/{owner}/{repo}/git/trees/HEAD?recursive=1`
//! - `GET {api}/repos/{owner}/{repo}/contents/{path}` (raw media type)

use crate::infrastructure::extraction::{in_excluded_dir, ExtractedCode, ExtractionError, ExtractionLimits};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const CLIENT_USER_AGENT: &str = concat!("swarm-review/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Owner and repository name parsed from a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// Accepts `https://github.com/o/r`, `github.com/o/r.git`,
    /// `https://github.com/o/r/tree/main/src` and similar.
    pub fn parse(url: &str) -> Result<Self, ExtractionError> {
        let trimmed = url.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        let mut parts = without_scheme.split('/').filter(|p| !p.is_empty());
        let host = parts.next().unwrap_or_default().to_ascii_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return Err(ExtractionError::UnsupportedTarget(format!(
                "only github.com repositories are supported: {}",
                url
            )));
        }

        let owner = parts.next();
        let repo = parts.next().map(|r| r.strip_suffix(".git").unwrap_or(r));
        match (owner, repo) {
            (Some(owner), Some(repo)) if !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(ExtractionError::UnsupportedTarget(format!(
                "expected github.com/<owner>/<repo>: {}",
                url
            ))),
        }
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn get(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, accept);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list_tree(&self, repo: &RepositoryRef) -> Result<TreeResponse, ExtractionError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/HEAD?recursive=1",
            self.api_url, repo.owner, repo.repo
        );
        let response = self
            .get(&url, JSON_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| ExtractionError::Remote(format!("tree request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Remote(format!(
                "tree request for {}/{} returned HTTP {}: {}",
                repo.owner,
                repo.repo,
                status.as_u16(),
                body
            )));
        }

        response
            .json::<TreeResponse>()
            .await
            .map_err(|e| ExtractionError::Remote(format!("invalid tree response: {}", e)))
    }

    async fn fetch_file(&self, repo: &RepositoryRef, path: &str) -> Result<String, String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, repo.owner, repo.repo, path
        );
        let response = self
            .get(&url, RAW_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }
        response.text().await.map_err(|e| e.to_string())
    }

    /// Fetch reviewable files from a repository URL.
    ///
    /// Failing to list the tree is an error; a failed file download is
    /// recorded in `errors` and the remaining files are still fetched.
    pub async fn extract(&self, url: &str, limits: &ExtractionLimits) -> Result<ExtractedCode, ExtractionError> {
        let repo = RepositoryRef::parse(url)?;
        let tree = self.list_tree(&repo).await?;
        if tree.truncated {
            warn!(owner = %repo.owner, repo = %repo.repo, "Repository tree listing was truncated");
        }

        let mut blobs: Vec<TreeEntry> = tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .filter(|entry| limits.is_allowed(&entry.path) && !in_excluded_dir(&entry.path))
            .collect();
        blobs.sort_by(|a, b| a.path.cmp(&b.path));

        let mut extracted = ExtractedCode::default();
        for blob in blobs {
            if let Some(size) = blob.size.filter(|size| *size > limits.max_file_bytes) {
                extracted.skip(
                    blob.path,
                    format!("{} bytes exceeds limit of {} bytes", size, limits.max_file_bytes),
                );
                continue;
            }

            match self.fetch_file(&repo, &blob.path).await {
                Ok(content) => {
                    debug!(path = %blob.path, "Fetched remote file");
                    // Tree entries may omit `size`; check the downloaded body too.
                    let size = content.len() as u64;
                    if size > limits.max_file_bytes {
                        extracted.skip(
                            blob.path,
                            format!("{} bytes exceeds limit of {} bytes", size, limits.max_file_bytes),
                        );
                        continue;
                    }
                    if !extracted.offer(blob.path, content, limits) {
                        break;
                    }
                }
                Err(e) => {
                    warn!(path = %blob.path, error = %e, "Failed to fetch remote file");
                    extracted.errors.push(format!("{}: {}", blob.path, e));
                }
            }
        }

        Ok(extracted)
    }
}
