//! Session log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use anivps_core::error::{AppError, ErrorKind};
use anivps_core::result::AppResult;
use anivps_entity::log::{CreateSessionLog, SessionLogEntry};

use crate::store::SessionLogStore;

/// Postgres-backed [`SessionLogStore`] over the `session_logs` table.
#[derive(Debug, Clone)]
pub struct SessionLogRepository {
    pool: PgPool,
}

impl SessionLogRepository {
    /// Create a new session log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionLogStore for SessionLogRepository {
    async fn append(&self, data: &CreateSessionLog) -> AppResult<SessionLogEntry> {
        sqlx::query_as::<_, SessionLogEntry>(
            "INSERT INTO session_logs (session_id, log_type, message, metadata) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.session_id)
        .bind(data.log_type)
        .bind(&data.message)
        .bind(&data.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append session log", e)
        })
    }

    async fn list_recent(&self, session_id: Uuid, limit: i64) -> AppResult<Vec<SessionLogEntry>> {
        sqlx::query_as::<_, SessionLogEntry>(
            "SELECT * FROM session_logs WHERE session_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list session logs", e)
        })
    }
}
