//! # anivps-api
//!
//! HTTP API layer for the VPS console built on Axum.
//!
//! Provides the session, management, callback and janitor endpoints, the
//! live log WebSocket, middleware (request logging, CORS, compression),
//! extractors, DTOs and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
