//! The provider boundary used by the lifecycle controller.

use std::fmt::Debug;

use async_trait::async_trait;

use anivps_core::result::AppResult;

use crate::models::{CancelOutcome, CommitRef, RepoHandle, WorkflowRun};

/// Operations against the CI provider, authenticated per call.
///
/// Every call except [`cancel_run`](Self::cancel_run) is a real external
/// state mutation or read and fails with a `Provider` error on any non-2xx
/// answer. Nothing is retried.
#[async_trait]
pub trait WorkflowDriver: Send + Sync + Debug {
    /// Create a repository owned by the token's account.
    async fn create_repository(
        &self,
        token: &str,
        name: &str,
        private: bool,
    ) -> AppResult<RepoHandle>;

    /// Create `path` with `content` on the default branch.
    async fn upload_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> AppResult<CommitRef>;

    /// Trigger `workflow_file` on `git_ref`. The provider returns no run id.
    async fn dispatch_workflow(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        workflow_file: &str,
        git_ref: &str,
    ) -> AppResult<()>;

    /// Workflow runs of the repository, newest first.
    async fn list_runs(&self, token: &str, owner: &str, repo: &str) -> AppResult<Vec<WorkflowRun>>;

    /// Full text of a run's logs.
    async fn download_run_logs(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        run_id: i64,
    ) -> AppResult<String>;

    /// Ask the provider to cancel a run. Never fails; refusals are reported
    /// in the outcome.
    async fn cancel_run(&self, token: &str, owner: &str, repo: &str, run_id: i64)
    -> CancelOutcome;
}
