//! Session lifecycle, queries, live logs and analytics.

pub mod analytics;
pub mod lifecycle;
pub mod log_bus;
pub mod logger;
pub mod service;

pub use analytics::{DailyUsage, SessionAnalytics};
pub use lifecycle::{KillOutcome, ProvisionParams, ProvisioningController, RemoteCancel};
pub use log_bus::LogBus;
pub use logger::SessionLogger;
pub use service::SessionService;
