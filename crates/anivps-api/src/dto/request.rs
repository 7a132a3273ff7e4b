//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/sessions`.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Provider token; held in memory only.
    #[validate(length(min = 1, message = "githubToken is required"))]
    pub github_token: String,
    /// Workflow definition to upload.
    #[validate(length(min = 1, message = "workflowContent is required"))]
    pub workflow_content: String,
    /// Repository name; generated when absent.
    #[validate(length(min = 1, max = 100))]
    pub repo_name: Option<String>,
    pub os_type: Option<String>,
    pub vps_config: Option<String>,
    pub networking_type: Option<String>,
}

impl std::fmt::Debug for CreateSessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSessionRequest")
            .field("github_token", &"[REDACTED]")
            .field("repo_name", &self.repo_name)
            .field("os_type", &self.os_type)
            .field("vps_config", &self.vps_config)
            .field("networking_type", &self.networking_type)
            .finish()
    }
}

/// Query of `GET /api/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionListQuery {
    pub is_active: Option<bool>,
    /// `pending`, `connected`, `failed` or `killed`.
    pub status: Option<String>,
}

/// Query of `GET /api/sessions/{id}/logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    /// Newest entries to return (1..=500, default 100).
    pub limit: Option<i64>,
}

/// Query of `GET /api/analytics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    /// Caller's offset from UTC in minutes, east positive.
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

/// Action of `POST /api/manage-session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManageAction {
    Kill,
    Start,
}

/// Body of `POST /api/manage-session`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageSessionRequest {
    pub session_id: Uuid,
    pub action: ManageAction,
    /// Required for `start`; overrides the held token for `kill`.
    pub github_token: Option<String>,
    /// Run to cancel on `kill`; defaults to the tracked run.
    pub workflow_run_id: Option<i64>,
}

impl std::fmt::Debug for ManageSessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManageSessionRequest")
            .field("session_id", &self.session_id)
            .field("action", &self.action)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("workflow_run_id", &self.workflow_run_id)
            .finish()
    }
}

/// Body of `POST /api/update-rdp-info`, posted by the running workflow.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RdpInfoRequest {
    /// `owner/name` or bare repository name.
    #[validate(length(min = 1, message = "repoName is required"))]
    pub repo_name: String,
    /// Reachable address of the desktop.
    #[validate(length(min = 1, message = "ngrokUrl is required"))]
    pub ngrok_url: String,
    #[validate(length(min = 1, message = "rdpUser is required"))]
    pub rdp_user: String,
    #[validate(length(min = 1, message = "rdpPassword is required"))]
    pub rdp_password: String,
}

impl std::fmt::Debug for RdpInfoRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdpInfoRequest")
            .field("repo_name", &self.repo_name)
            .field("ngrok_url", &self.ngrok_url)
            .field("rdp_user", &self.rdp_user)
            .field("rdp_password", &"[REDACTED]")
            .finish()
    }
}
