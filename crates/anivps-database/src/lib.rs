//! # anivps-database
//!
//! PostgreSQL connection management, the session store abstractions, their
//! Postgres repositories and an in-memory implementation for tests and
//! local development.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::{SessionLogRepository, SessionRepository};
pub use store::{DeletedSession, SessionFilter, SessionLogStore, SessionStore};
