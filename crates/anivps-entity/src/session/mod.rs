//! VPS session domain entities.

pub mod model;
pub mod profile;
pub mod status;

pub use model::{CreateVpsSession, VpsSession};
pub use profile::{NetworkingType, OsType, TierSpec, VpsTier};
pub use status::{ProvisionPhase, SessionStatus};
