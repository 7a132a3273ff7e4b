//! VPS session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::profile::{NetworkingType, OsType, VpsTier};
use super::status::{ProvisionPhase, SessionStatus};

/// One attempt to provision a remote desktop through a CI workflow.
///
/// Rows are created by the lifecycle controller, advanced by the
/// provisioning worker, and destroyed only by the janitor sweep or an
/// explicit delete.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VpsSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// Owning account (absent on legacy rows).
    pub user_id: Option<Uuid>,
    /// `owner/name` of the repository on the provider. Holds the bare
    /// intended name until the repository exists.
    pub github_repo: String,
    /// Provider HTML URL of the repository.
    pub repo_url: Option<String>,
    /// Branch the workflow is dispatched on.
    pub default_branch: Option<String>,

    // -- Profile --
    /// Operating system.
    pub os_type: Option<OsType>,
    /// Hardware tier.
    pub vps_config: Option<VpsTier>,
    /// Tunnel type.
    pub networking_type: Option<NetworkingType>,

    // -- Lifecycle --
    /// User-visible status, always `phase.status()`.
    pub status: SessionStatus,
    /// Persisted provisioning step.
    pub phase: ProvisionPhase,
    /// Cleared by kill, independent of status.
    pub is_active: bool,

    // -- Worker bookkeeping --
    /// Run discovered while polling.
    pub workflow_run_id: Option<i64>,
    /// Poll iterations spent so far.
    pub poll_attempts: i32,
    /// When the worker should next advance this session.
    pub next_poll_at: Option<DateTime<Utc>>,
    /// When the workflow was last dispatched.
    pub dispatched_at: Option<DateTime<Utc>>,

    // -- Credentials --
    /// Address (IP, hostname or tunnel URL) of the desktop.
    pub rdp_address: Option<String>,
    /// Login user.
    pub rdp_username: Option<String>,
    /// Login password.
    pub rdp_password: Option<String>,
    /// Optional browser console URL.
    pub console_url: Option<String>,

    // -- Timestamps --
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the current provisioning attempt began. Reset by a restart;
    /// the janitor ages stale pending sessions from here.
    pub provisioning_started_at: DateTime<Utc>,
    /// When credentials were first recorded.
    pub started_at: Option<DateTime<Utc>>,
    /// Hard TTL.
    pub expires_at: DateTime<Utc>,
    /// Last write.
    pub updated_at: DateTime<Utc>,

    // -- Usage --
    /// Cumulative connected time.
    pub total_uptime_minutes: i32,
    /// Number of client (re)connects.
    pub connection_count: i32,
}

impl VpsSession {
    /// Move to `phase`, keeping `status` as its projection.
    pub fn set_phase(&mut self, phase: ProvisionPhase) {
        self.phase = phase;
        self.status = phase.status();
    }

    /// Whether address, username and password are all present and non-empty.
    pub fn has_credentials(&self) -> bool {
        [&self.rdp_address, &self.rdp_username, &self.rdp_password]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Drop every recorded credential.
    pub fn clear_credentials(&mut self) {
        self.rdp_address = None;
        self.rdp_username = None;
        self.rdp_password = None;
        self.console_url = None;
    }

    /// Split `github_repo` into `(owner, name)`, if it is qualified.
    pub fn repo_parts(&self) -> Option<(&str, &str)> {
        self.github_repo
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
    }

    /// The repository name without its owner.
    pub fn repo_name(&self) -> &str {
        self.repo_parts()
            .map(|(_, name)| name)
            .unwrap_or(&self.github_repo)
    }

    /// Whole minutes connected since `started_at`, measured at `now`.
    pub fn uptime_minutes_at(&self, now: DateTime<Utc>) -> i32 {
        self.started_at
            .map(|started| (now - started).num_minutes().clamp(0, i32::MAX as i64) as i32)
            .unwrap_or(0)
    }
}

/// Data required to insert a new session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVpsSession {
    /// Owning account.
    pub user_id: Option<Uuid>,
    /// Intended repository name (qualified once created).
    pub github_repo: String,
    /// Operating system.
    pub os_type: Option<OsType>,
    /// Hardware tier.
    pub vps_config: Option<VpsTier>,
    /// Tunnel type.
    pub networking_type: Option<NetworkingType>,
    /// Hard TTL.
    pub expires_at: DateTime<Utc>,
}
