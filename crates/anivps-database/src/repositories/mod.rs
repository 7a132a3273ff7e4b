//! Postgres implementations of the session stores.

pub mod session;
pub mod session_log;

pub use session::SessionRepository;
pub use session_log::SessionLogRepository;
