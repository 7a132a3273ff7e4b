//! Session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use anivps_core::error::{AppError, ErrorKind};
use anivps_core::result::AppResult;
use anivps_core::types::pagination::{PageRequest, PageResponse};
use anivps_entity::session::{CreateVpsSession, ProvisionPhase, VpsSession};

use crate::store::{DeletedSession, SessionFilter, SessionStore};

/// Postgres-backed [`SessionStore`] over the `rdp_sessions` table.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write every mutable column, optionally guarded on the stored phase.
    async fn update(
        &self,
        session: &VpsSession,
        expected: Option<ProvisionPhase>,
    ) -> AppResult<Option<VpsSession>> {
        sqlx::query_as::<_, VpsSession>(
            "UPDATE rdp_sessions SET github_repo = $2, repo_url = $3, default_branch = $4, \
             status = $5, phase = $6, is_active = $7, workflow_run_id = $8, poll_attempts = $9, \
             next_poll_at = $10, dispatched_at = $11, rdp_address = $12, rdp_username = $13, \
             rdp_password = $14, console_url = $15, started_at = $16, expires_at = $17, \
             total_uptime_minutes = $18, connection_count = $19, \
             provisioning_started_at = $20, updated_at = NOW() \
             WHERE id = $1 AND ($21::provision_phase IS NULL OR phase = $21) RETURNING *",
        )
        .bind(session.id)
        .bind(&session.github_repo)
        .bind(&session.repo_url)
        .bind(&session.default_branch)
        .bind(session.status)
        .bind(session.phase)
        .bind(session.is_active)
        .bind(session.workflow_run_id)
        .bind(session.poll_attempts)
        .bind(session.next_poll_at)
        .bind(session.dispatched_at)
        .bind(&session.rdp_address)
        .bind(&session.rdp_username)
        .bind(&session.rdp_password)
        .bind(&session.console_url)
        .bind(session.started_at)
        .bind(session.expires_at)
        .bind(session.total_uptime_minutes)
        .bind(session.connection_count)
        .bind(session.provisioning_started_at)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update session", e))
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn insert(&self, data: &CreateVpsSession) -> AppResult<VpsSession> {
        sqlx::query_as::<_, VpsSession>(
            "INSERT INTO rdp_sessions (user_id, github_repo, os_type, vps_config, networking_type, \
             status, phase, is_active, expires_at) \
             VALUES ($1, $2, $3, $4, $5, 'pending', 'provisioning', TRUE, $6) RETURNING *",
        )
        .bind(data.user_id)
        .bind(&data.github_repo)
        .bind(data.os_type)
        .bind(data.vps_config)
        .bind(data.networking_type)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VpsSession>> {
        sqlx::query_as::<_, VpsSession>("SELECT * FROM rdp_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn find_by_repo(&self, repo: &str) -> AppResult<Option<VpsSession>> {
        sqlx::query_as::<_, VpsSession>(
            "SELECT * FROM rdp_sessions \
             WHERE github_repo = $1 OR split_part(github_repo, '/', 2) = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(repo)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by repo", e)
        })
    }

    async fn find_by_filter(&self, filter: &SessionFilter) -> AppResult<Vec<VpsSession>> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if filter.user_id.is_some() {
            conditions.push(format!("user_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.is_active.is_some() {
            conditions.push(format!("is_active = ${param_idx}"));
            param_idx += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT * FROM rdp_sessions {where_clause} ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, VpsSession>(&sql);
        if let Some(uid) = filter.user_id {
            query = query.bind(uid);
        }
        if let Some(active) = filter.is_active {
            query = query.bind(active);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to filter sessions", e))
    }

    async fn find_all(&self, page: &PageRequest) -> AppResult<PageResponse<VpsSession>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rdp_sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count sessions", e)
            })?;

        let sessions = sqlx::query_as::<_, VpsSession>(
            "SELECT * FROM rdp_sessions ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))?;

        Ok(PageResponse::new(
            sessions,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn find_due_for_provisioning(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<VpsSession>> {
        sqlx::query_as::<_, VpsSession>(
            "SELECT * FROM rdp_sessions WHERE phase IN ('dispatching', 'polling') \
             AND (next_poll_at IS NULL OR next_poll_at <= $1) \
             ORDER BY next_poll_at ASC NULLS FIRST LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find due sessions", e)
        })
    }

    async fn save(&self, session: &VpsSession) -> AppResult<VpsSession> {
        self.update(session, None)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {} not found", session.id)))
    }

    async fn save_if_phase(
        &self,
        session: &VpsSession,
        expected: ProvisionPhase,
    ) -> AppResult<Option<VpsSession>> {
        self.update(session, Some(expected)).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM rdp_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete session", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_defunct(
        &self,
        now: DateTime<Utc>,
        pending_cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<DeletedSession>> {
        sqlx::query_as::<_, DeletedSession>(
            "DELETE FROM rdp_sessions WHERE status = 'failed' OR expires_at < $1 \
             OR (status = 'pending' AND provisioning_started_at < $2) \
             RETURNING id, github_repo",
        )
        .bind(now)
        .bind(pending_cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete defunct sessions", e)
        })
    }
}
