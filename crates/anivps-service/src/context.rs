//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use anivps_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Built from verified bearer token claims and passed into service methods
/// so that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// Account email, when the token carries one.
    pub email: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, role: UserRole, email: Option<String>) -> Self {
        Self {
            user_id,
            role,
            email,
            request_time: Utc::now(),
        }
    }

    /// Context for operator tooling running with full privileges.
    pub fn system() -> Self {
        Self::new(Uuid::nil(), UserRole::SuperAdmin, None)
    }

    /// Returns whether the caller may act on other users' sessions.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
