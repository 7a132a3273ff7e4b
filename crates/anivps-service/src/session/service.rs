//! Read-side session queries: lookup, listings, log trail and analytics.

use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use anivps_auth::RbacEnforcer;
use anivps_core::error::AppError;
use anivps_core::result::AppResult;
use anivps_core::types::pagination::{PageRequest, PageResponse};
use anivps_database::{SessionFilter, SessionLogStore, SessionStore};
use anivps_entity::log::SessionLogEntry;
use anivps_entity::session::VpsSession;

use crate::context::RequestContext;

use super::analytics::{self, SessionAnalytics};
use super::log_bus::LogBus;

/// Default number of log entries returned.
pub const DEFAULT_LOG_LIMIT: i64 = 100;
/// Upper bound on log entries per request.
pub const MAX_LOG_LIMIT: i64 = 500;

/// Offsets beyond ±14h do not exist.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Session queries scoped to the caller.
#[derive(Debug, Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    logs: Arc<dyn SessionLogStore>,
    bus: Arc<LogBus>,
    rbac: RbacEnforcer,
}

impl SessionService {
    /// Creates a new session service.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        logs: Arc<dyn SessionLogStore>,
        bus: Arc<LogBus>,
    ) -> Self {
        Self {
            sessions,
            logs,
            bus,
            rbac: RbacEnforcer::new(),
        }
    }

    /// One session the caller may see.
    pub async fn get(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<VpsSession> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;
        self.rbac
            .require_owner_or_admin(ctx.user_id, &ctx.role, session.user_id)?;
        Ok(session)
    }

    /// Sessions matching `filter`, newest first.
    ///
    /// Non-admins always see only their own sessions; admins default to
    /// their own unless the filter names another owner.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        mut filter: SessionFilter,
    ) -> AppResult<Vec<VpsSession>> {
        if !ctx.is_admin() || filter.user_id.is_none() {
            filter.user_id = Some(ctx.user_id);
        }
        self.sessions.find_by_filter(&filter).await
    }

    /// Every session, paginated. Admin only.
    pub async fn list_all(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> AppResult<PageResponse<VpsSession>> {
        self.rbac.require_admin(&ctx.role)?;
        self.sessions.find_all(&page.normalized()).await
    }

    /// Newest-first log trail of a session.
    pub async fn logs(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
        limit: Option<i64>,
    ) -> AppResult<Vec<SessionLogEntry>> {
        let session = self.get(ctx, session_id).await?;
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        self.logs.list_recent(session.id, limit).await
    }

    /// Live feed of entries appended to a session from now on.
    pub async fn subscribe_logs(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> AppResult<broadcast::Receiver<SessionLogEntry>> {
        let session = self.get(ctx, session_id).await?;
        Ok(self.bus.subscribe(session.id).await)
    }

    /// Rollups over the caller's own sessions, with calendar days in the
    /// caller's UTC offset.
    pub async fn analytics(
        &self,
        ctx: &RequestContext,
        offset_minutes: i32,
    ) -> AppResult<SessionAnalytics> {
        if offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(AppError::validation(format!(
                "UTC offset of {offset_minutes} minutes is out of range"
            )));
        }
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| AppError::validation("Invalid UTC offset"))?;

        let sessions = self
            .sessions
            .find_by_filter(&SessionFilter::for_user(ctx.user_id))
            .await?;
        Ok(analytics::compute(&sessions, Utc::now(), offset))
    }
}
