//! Role and ownership enforcement for session operations.

use uuid::Uuid;

use anivps_core::error::AppError;
use anivps_entity::user::UserRole;

/// Decides whether a caller may act on a resource.
///
/// Owners may act on their own sessions; `admin` and `super_admin` may act
/// on anyone's.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Checks whether the given role is at least the specified minimum role.
    pub fn require_minimum_role(
        &self,
        actual_role: &UserRole,
        minimum_role: &UserRole,
    ) -> Result<(), AppError> {
        if actual_role.has_at_least(minimum_role) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{actual_role}' is insufficient; requires at least '{minimum_role}'"
            )))
        }
    }

    /// Requires `admin` or `super_admin`.
    pub fn require_admin(&self, role: &UserRole) -> Result<(), AppError> {
        self.require_minimum_role(role, &UserRole::Admin)
    }

    /// Requires the caller to own the resource, or to be an admin.
    pub fn require_owner_or_admin(
        &self,
        caller: Uuid,
        role: &UserRole,
        owner: Option<Uuid>,
    ) -> Result<(), AppError> {
        if owner == Some(caller) || role.is_admin() {
            Ok(())
        } else {
            Err(AppError::authorization(
                "You do not have access to this session",
            ))
        }
    }
}
