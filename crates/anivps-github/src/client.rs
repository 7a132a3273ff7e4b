//! reqwest-backed [`WorkflowDriver`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use anivps_core::config::GitHubConfig;
use anivps_core::error::AppError;
use anivps_core::result::AppResult;

use crate::driver::WorkflowDriver;
use crate::error::GitHubError;
use crate::logs::read_log_bundle;
use crate::models::{CancelOutcome, CommitRef, RepoHandle, WorkflowRun};

/// Media type GitHub recommends for REST calls.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Number of runs requested per poll.
const RUNS_PER_PAGE: u32 = 20;

/// GitHub REST client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    max_log_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    html_url: String,
    #[serde(default)]
    default_branch: Option<String>,
    owner: RepoOwner,
}

#[derive(Debug, Deserialize)]
struct ContentCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    path: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    commit: ContentCommit,
    content: Option<ContentFile>,
}

#[derive(Debug, Deserialize)]
struct RunList {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GitHubClient {
    /// Build a client from the `[github]` configuration section.
    pub fn new(config: &GitHubConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_str(&config.api_version).map_err(|e| {
                AppError::configuration(format!("Invalid github.api_version: {e}"))
            })?,
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build GitHub HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_log_bytes: config.max_log_bundle_bytes,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the response on 2xx, otherwise an [`GitHubError::Api`] with
    /// the provider's message.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, GitHubError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(GitHubError::Api {
            operation,
            status: status.as_u16(),
            message: api_message(&body, status.canonical_reason()),
        })
    }

    async fn cancel(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        run_id: i64,
    ) -> Result<(), GitHubError> {
        const OP: &str = "Run cancellation";
        let response = self
            .http
            .post(self.url(&format!(
                "/repos/{owner}/{repo}/actions/runs/{run_id}/cancel"
            )))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;
        Self::ensure_success(response, OP).await?;
        Ok(())
    }
}

/// Extract GitHub's `message` from an error body, falling back to the raw
/// body and then to the status reason.
fn api_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(500).collect();
    }
    reason.unwrap_or("Unknown error").to_string()
}

#[async_trait]
impl WorkflowDriver for GitHubClient {
    async fn create_repository(
        &self,
        token: &str,
        name: &str,
        private: bool,
    ) -> AppResult<RepoHandle> {
        const OP: &str = "Repository creation";
        let response = self
            .http
            .post(self.url("/user/repos"))
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "private": private,
                "auto_init": true,
                "description": "Ephemeral VPS session",
            }))
            .send()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;

        let repo: RepoResponse = Self::ensure_success(response, OP)
            .await?
            .json()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;

        info!(repo = %repo.full_name, private, "Created repository");
        Ok(RepoHandle {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            html_url: repo.html_url,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
        })
    }

    async fn upload_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> AppResult<CommitRef> {
        const OP: &str = "File upload";
        let response = self
            .http
            .put(self.url(&format!("/repos/{owner}/{repo}/contents/{path}")))
            .bearer_auth(token)
            .json(&json!({
                "message": message,
                "content": STANDARD.encode(content.as_bytes()),
            }))
            .send()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;

        let written: ContentResponse = Self::ensure_success(response, OP)
            .await?
            .json()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;

        debug!(repo = %format!("{owner}/{repo}"), path, sha = %written.commit.sha, "Uploaded file");
        Ok(CommitRef {
            sha: written.commit.sha,
            path: written
                .content
                .map(|c| c.path)
                .unwrap_or_else(|| path.to_string()),
        })
    }

    async fn dispatch_workflow(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        workflow_file: &str,
        git_ref: &str,
    ) -> AppResult<()> {
        const OP: &str = "Workflow dispatch";
        let response = self
            .http
            .post(self.url(&format!(
                "/repos/{owner}/{repo}/actions/workflows/{workflow_file}/dispatches"
            )))
            .bearer_auth(token)
            .json(&json!({ "ref": git_ref }))
            .send()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;
        Self::ensure_success(response, OP).await?;

        info!(repo = %format!("{owner}/{repo}"), workflow_file, git_ref, "Dispatched workflow");
        Ok(())
    }

    async fn list_runs(&self, token: &str, owner: &str, repo: &str) -> AppResult<Vec<WorkflowRun>> {
        const OP: &str = "Run listing";
        let response = self
            .http
            .get(self.url(&format!(
                "/repos/{owner}/{repo}/actions/runs?per_page={RUNS_PER_PAGE}"
            )))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;

        let mut runs = Self::ensure_success(response, OP)
            .await?
            .json::<RunList>()
            .await
            .map_err(|e| GitHubError::http(OP, e))?
            .workflow_runs;
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    async fn download_run_logs(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        run_id: i64,
    ) -> AppResult<String> {
        const OP: &str = "Log download";
        let response = self
            .http
            .get(self.url(&format!(
                "/repos/{owner}/{repo}/actions/runs/{run_id}/logs"
            )))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;
        let response = Self::ensure_success(response, OP).await?;

        if let Some(size) = response
            .content_length()
            .filter(|size| *size > self.max_log_bytes)
        {
            return Err(GitHubError::BundleTooLarge {
                size,
                limit: self.max_log_bytes,
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GitHubError::http(OP, e))?;
        if body.len() as u64 > self.max_log_bytes {
            return Err(GitHubError::BundleTooLarge {
                size: body.len() as u64,
                limit: self.max_log_bytes,
            }
            .into());
        }

        debug!(run_id, bytes = body.len(), "Downloaded run logs");
        Ok(read_log_bundle(&body, self.max_log_bytes)?)
    }

    async fn cancel_run(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        run_id: i64,
    ) -> CancelOutcome {
        match self.cancel(token, owner, repo, run_id).await {
            Ok(()) => {
                info!(run_id, repo = %format!("{owner}/{repo}"), "Cancelled workflow run");
                CancelOutcome::Confirmed
            }
            Err(e) => {
                warn!(
                    run_id,
                    repo = %format!("{owner}/{repo}"),
                    error = %e,
                    "Run cancellation was not accepted"
                );
                CancelOutcome::Rejected(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_prefers_json_message() {
        let body = r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com"}"#;
        assert_eq!(api_message(body, Some("Unauthorized")), "Bad credentials");
    }

    #[test]
    fn test_api_message_falls_back() {
        assert_eq!(api_message("  upstream exploded ", None), "upstream exploded");
        assert_eq!(api_message("", Some("Not Found")), "Not Found");
        assert_eq!(api_message("", None), "Unknown error");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = GitHubConfig {
            api_base_url: "https://ghe.example.com/api/v3/".to_string(),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::new(&config).unwrap();
        assert_eq!(
            client.url("/user/repos"),
            "https://ghe.example.com/api/v3/user/repos"
        );
    }
}
