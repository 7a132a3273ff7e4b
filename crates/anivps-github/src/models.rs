//! Provider resources returned by the driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository created on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoHandle {
    /// Account login that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Browser URL.
    pub html_url: String,
    /// Default branch, used as the dispatch ref.
    pub default_branch: String,
}

/// Commit produced by a file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    /// Commit SHA.
    pub sha: String,
    /// Path that was written.
    pub path: String,
}

/// One entry of a repository's workflow run list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Run identifier.
    pub id: i64,
    /// `queued`, `in_progress`, `completed`, ...
    #[serde(default)]
    pub status: Option<String>,
    /// `success`, `failure`, `cancelled`, ... once completed.
    #[serde(default)]
    pub conclusion: Option<String>,
    /// Trigger event.
    #[serde(default)]
    pub event: Option<String>,
    /// Branch the run executes on.
    #[serde(default)]
    pub head_branch: Option<String>,
    /// Browser URL.
    #[serde(default)]
    pub html_url: Option<String>,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// Whether the run has finished, whatever its outcome.
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }

    /// Whether the run finished successfully.
    pub fn is_success(&self) -> bool {
        self.is_completed() && self.conclusion.as_deref() == Some("success")
    }

    /// Status for logging, `unknown` when absent.
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    /// Conclusion for logging, `none` when absent.
    pub fn conclusion_label(&self) -> &str {
        self.conclusion.as_deref().unwrap_or("none")
    }
}

/// Result of a best-effort run cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// The provider accepted the cancellation.
    Confirmed,
    /// The provider refused or could not be reached.
    Rejected(String),
}
