//! Storage abstractions for sessions and their log trail.
//!
//! The lifecycle controller, janitor and analytics only see these traits;
//! production wires the Postgres repositories, tests wire [`MemoryStore`].
//!
//! [`MemoryStore`]: crate::memory::MemoryStore

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use anivps_core::result::AppResult;
use anivps_core::types::pagination::{PageRequest, PageResponse};
use anivps_entity::log::{CreateSessionLog, SessionLogEntry};
use anivps_entity::session::{CreateVpsSession, ProvisionPhase, SessionStatus, VpsSession};

/// Composite filter used by dashboards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    /// Restrict to one owner.
    pub user_id: Option<Uuid>,
    /// Restrict by the active flag.
    pub is_active: Option<bool>,
    /// Restrict by status.
    pub status: Option<SessionStatus>,
}

impl SessionFilter {
    /// Filter on a single owner.
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Whether `session` satisfies every set condition.
    pub fn matches(&self, session: &VpsSession) -> bool {
        self.user_id.is_none_or(|uid| session.user_id == Some(uid))
            && self.is_active.is_none_or(|a| session.is_active == a)
            && self.status.is_none_or(|s| session.status == s)
    }
}

/// Identity of a row removed by the janitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeletedSession {
    /// Session identifier.
    pub id: Uuid,
    /// Repository the session was bound to.
    pub github_repo: String,
}

/// Persistence of [`VpsSession`] rows.
#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Insert a new session in the `provisioning` phase.
    async fn insert(&self, data: &CreateVpsSession) -> AppResult<VpsSession>;

    /// Find a session by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VpsSession>>;

    /// Find a session by `owner/name` or by bare repository name.
    async fn find_by_repo(&self, repo: &str) -> AppResult<Option<VpsSession>>;

    /// All sessions matching `filter`, newest first.
    async fn find_by_filter(&self, filter: &SessionFilter) -> AppResult<Vec<VpsSession>>;

    /// Page through every session, newest first.
    async fn find_all(&self, page: &PageRequest) -> AppResult<PageResponse<VpsSession>>;

    /// Worker-driven sessions whose `next_poll_at` is at or before `now`.
    async fn find_due_for_provisioning(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<VpsSession>>;

    /// Persist every mutable column of `session` (last write wins).
    async fn save(&self, session: &VpsSession) -> AppResult<VpsSession>;

    /// Persist `session` only while the stored row is still in `expected`.
    ///
    /// Returns `None` when the row moved on (or vanished) since it was read,
    /// leaving the stored row untouched.
    async fn save_if_phase(
        &self,
        session: &VpsSession,
        expected: ProvisionPhase,
    ) -> AppResult<Option<VpsSession>>;

    /// Hard-delete one session. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Hard-delete every failed, expired or stale pending session.
    ///
    /// A pending session is stale once its current provisioning attempt
    /// began before `pending_cutoff`.
    async fn delete_defunct(
        &self,
        now: DateTime<Utc>,
        pending_cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<DeletedSession>>;
}

/// Append-only persistence of [`SessionLogEntry`] rows.
#[async_trait]
pub trait SessionLogStore: Send + Sync + Debug {
    /// Append one entry.
    async fn append(&self, data: &CreateSessionLog) -> AppResult<SessionLogEntry>;

    /// The newest `limit` entries of a session, newest first.
    async fn list_recent(&self, session_id: Uuid, limit: i64) -> AppResult<Vec<SessionLogEntry>>;
}
