//! # anivps-service
//!
//! Business logic for the VPS console: the provisioning state machine,
//! session queries, the janitor sweep and usage analytics.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references to the store and driver
//! traits.

pub mod context;
pub mod credentials;
pub mod janitor;
pub mod session;

pub use context::RequestContext;
pub use credentials::{CredentialVault, ScrapedCredentials};
pub use janitor::{Janitor, SweepReport};
pub use session::{
    KillOutcome, LogBus, ProvisionParams, ProvisioningController, RemoteCancel, SessionAnalytics,
    SessionLogger, SessionService,
};
