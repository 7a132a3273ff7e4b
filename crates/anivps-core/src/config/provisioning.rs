//! Provisioning sequence configuration.

use serde::{Deserialize, Serialize};

/// Knobs for the create → upload → dispatch → poll sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Prefix of every repository created on the provider.
    #[serde(default = "default_repo_prefix")]
    pub repo_prefix: String,
    /// Whether created repositories are private.
    #[serde(default = "default_true")]
    pub private_repos: bool,
    /// File name of the uploaded workflow under `.github/workflows/`.
    #[serde(default = "default_workflow_file")]
    pub workflow_file: String,
    /// Commit message used for the workflow upload.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// Seconds to wait between upload and dispatch so the provider
    /// registers the new workflow file.
    #[serde(default = "default_dispatch_delay")]
    pub dispatch_delay_seconds: u64,
    /// Seconds between two polls of the run list.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Poll iterations before the session is failed with a timeout.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Hard TTL of a session, from creation or restart.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            repo_prefix: default_repo_prefix(),
            private_repos: default_true(),
            workflow_file: default_workflow_file(),
            commit_message: default_commit_message(),
            dispatch_delay_seconds: default_dispatch_delay(),
            poll_interval_seconds: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            session_ttl_minutes: default_session_ttl(),
        }
    }
}

impl ProvisioningConfig {
    /// Repository path of the uploaded workflow definition.
    pub fn workflow_path(&self) -> String {
        format!(".github/workflows/{}", self.workflow_file)
    }
}

fn default_repo_prefix() -> String {
    "vps".to_string()
}

fn default_true() -> bool {
    true
}

fn default_workflow_file() -> String {
    "vps.yml".to_string()
}

fn default_commit_message() -> String {
    "Add VPS workflow".to_string()
}

fn default_dispatch_delay() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_session_ttl() -> i64 {
    360
}
