//! Session status and provisioning phase enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse, user-visible status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vps_session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Provisioning is in flight or waiting for credentials.
    Pending,
    /// Credentials are known and the desktop is reachable.
    Connected,
    /// Provisioning failed.
    Failed,
    /// Explicitly killed by a user or admin.
    Killed,
}

impl SessionStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::Killed => "killed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = anivps_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "connected" => Ok(Self::Connected),
            "failed" => Ok(Self::Failed),
            "killed" => Ok(Self::Killed),
            _ => Err(anivps_core::AppError::validation(format!(
                "Invalid session status: '{s}'. Expected one of: pending, connected, failed, killed"
            ))),
        }
    }
}

/// Step of the persisted provisioning state machine.
///
/// ```text
/// provisioning -> dispatching -> polling -> ready
///                                       \-> awaiting_callback -> ready
///                                       \-> failed
/// any -> killed
/// ready | failed | killed | awaiting_callback -> dispatching (restart)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "provision_phase", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProvisionPhase {
    /// Repository creation and workflow upload.
    Provisioning,
    /// Waiting for the dispatch delay to elapse.
    Dispatching,
    /// Polling the run list for the dispatched run.
    Polling,
    /// The run succeeded but no credentials were found in its logs.
    AwaitingCallback,
    /// Credentials recorded.
    Ready,
    /// Terminal failure.
    Failed,
    /// Killed.
    Killed,
}

impl ProvisionPhase {
    /// The status a session in this phase reports.
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Provisioning | Self::Dispatching | Self::Polling | Self::AwaitingCallback => {
                SessionStatus::Pending
            }
            Self::Ready => SessionStatus::Connected,
            Self::Failed => SessionStatus::Failed,
            Self::Killed => SessionStatus::Killed,
        }
    }

    /// Whether the background worker still has work to do in this phase.
    pub fn is_worker_driven(&self) -> bool {
        matches!(self, Self::Dispatching | Self::Polling)
    }

    /// Whether provisioning is still in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Provisioning | Self::Dispatching | Self::Polling)
    }

    /// Whether `start()` may restart a session in this phase.
    pub fn can_restart(&self) -> bool {
        !self.is_in_flight()
    }

    /// Return the phase as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Dispatching => "dispatching",
            Self::Polling => "polling",
            Self::AwaitingCallback => "awaiting_callback",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Killed => "killed",
        }
    }
}

impl fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
