//! In-memory session store for tests and single-node development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use anivps_core::error::AppError;
use anivps_core::result::AppResult;
use anivps_core::types::pagination::{PageRequest, PageResponse};
use anivps_entity::log::{CreateSessionLog, SessionLogEntry};
use anivps_entity::session::{
    CreateVpsSession, ProvisionPhase, SessionStatus, VpsSession,
};

use crate::store::{DeletedSession, SessionFilter, SessionLogStore, SessionStore};

/// Implements both store traits over process memory.
///
/// Mirrors the Postgres schema rules that callers rely on: `github_repo`
/// is unique and deleting a session drops its log trail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Session id → row.
    sessions: RwLock<HashMap<Uuid, VpsSession>>,
    /// Log entries in insertion order.
    logs: RwLock<Vec<SessionLogEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed row, replacing any row with the same id.
    pub async fn seed(&self, session: VpsSession) {
        self.sessions.write().await.insert(session.id, session);
    }

    /// Number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn drop_logs(&self, ids: &[Uuid]) {
        self.logs
            .write()
            .await
            .retain(|entry| !ids.contains(&entry.session_id));
    }
}

fn newest_first(sessions: &mut [VpsSession]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, data: &CreateVpsSession) -> AppResult<VpsSession> {
        let mut sessions = self.sessions.write().await;
        if sessions
            .values()
            .any(|s| s.github_repo == data.github_repo)
        {
            return Err(AppError::conflict(format!(
                "Repository '{}' is already bound to a session",
                data.github_repo
            )));
        }

        let now = Utc::now();
        let session = VpsSession {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            github_repo: data.github_repo.clone(),
            repo_url: None,
            default_branch: None,
            os_type: data.os_type,
            vps_config: data.vps_config,
            networking_type: data.networking_type,
            status: SessionStatus::Pending,
            phase: ProvisionPhase::Provisioning,
            is_active: true,
            workflow_run_id: None,
            poll_attempts: 0,
            next_poll_at: None,
            dispatched_at: None,
            rdp_address: None,
            rdp_username: None,
            rdp_password: None,
            console_url: None,
            created_at: now,
            provisioning_started_at: now,
            started_at: None,
            expires_at: data.expires_at,
            updated_at: now,
            total_uptime_minutes: 0,
            connection_count: 0,
        };
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VpsSession>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn find_by_repo(&self, repo: &str) -> AppResult<Option<VpsSession>> {
        let sessions = self.sessions.read().await;
        let mut matches: Vec<VpsSession> = sessions
            .values()
            .filter(|s| s.github_repo == repo || s.repo_parts().is_some_and(|(_, n)| n == repo))
            .cloned()
            .collect();
        newest_first(&mut matches);
        Ok(matches.into_iter().next())
    }

    async fn find_by_filter(&self, filter: &SessionFilter) -> AppResult<Vec<VpsSession>> {
        let sessions = self.sessions.read().await;
        let mut matches: Vec<VpsSession> = sessions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        newest_first(&mut matches);
        Ok(matches)
    }

    async fn find_all(&self, page: &PageRequest) -> AppResult<PageResponse<VpsSession>> {
        let sessions = self.sessions.read().await;
        let mut all: Vec<VpsSession> = sessions.values().cloned().collect();
        newest_first(&mut all);

        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn find_due_for_provisioning(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<VpsSession>> {
        let sessions = self.sessions.read().await;
        let mut due: Vec<VpsSession> = sessions
            .values()
            .filter(|s| s.phase.is_worker_driven())
            .filter(|s| s.next_poll_at.is_none_or(|at| at <= now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.next_poll_at);
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn save(&self, session: &VpsSession) -> AppResult<VpsSession> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session.id)
            .ok_or_else(|| AppError::not_found(format!("Session {} not found", session.id)))?;

        let mut updated = session.clone();
        updated.updated_at = Utc::now();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn save_if_phase(
        &self,
        session: &VpsSession,
        expected: ProvisionPhase,
    ) -> AppResult<Option<VpsSession>> {
        let mut sessions = self.sessions.write().await;
        let Some(slot) = sessions
            .get_mut(&session.id)
            .filter(|stored| stored.phase == expected)
        else {
            return Ok(None);
        };

        let mut updated = session.clone();
        updated.updated_at = Utc::now();
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            self.drop_logs(&[id]).await;
        }
        Ok(removed)
    }

    async fn delete_defunct(
        &self,
        now: DateTime<Utc>,
        pending_cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<DeletedSession>> {
        let mut sessions = self.sessions.write().await;
        let doomed: Vec<DeletedSession> = sessions
            .values()
            .filter(|s| {
                s.status == SessionStatus::Failed
                    || s.expires_at < now
                    || (s.status == SessionStatus::Pending
                        && s.provisioning_started_at < pending_cutoff)
            })
            .map(|s| DeletedSession {
                id: s.id,
                github_repo: s.github_repo.clone(),
            })
            .collect();

        for deleted in &doomed {
            sessions.remove(&deleted.id);
        }
        drop(sessions);

        let ids: Vec<Uuid> = doomed.iter().map(|d| d.id).collect();
        self.drop_logs(&ids).await;
        Ok(doomed)
    }
}

#[async_trait]
impl SessionLogStore for MemoryStore {
    async fn append(&self, data: &CreateSessionLog) -> AppResult<SessionLogEntry> {
        if !self.sessions.read().await.contains_key(&data.session_id) {
            return Err(AppError::not_found(format!(
                "Session {} not found",
                data.session_id
            )));
        }

        let entry = SessionLogEntry {
            id: Uuid::new_v4(),
            session_id: data.session_id,
            log_type: data.log_type,
            message: data.message.clone(),
            metadata: data.metadata.clone(),
            created_at: Utc::now(),
        };
        self.logs.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn list_recent(&self, session_id: Uuid, limit: i64) -> AppResult<Vec<SessionLogEntry>> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|entry| entry.session_id == session_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
