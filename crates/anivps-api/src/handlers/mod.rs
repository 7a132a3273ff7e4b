//! HTTP request handlers.

pub mod admin;
pub mod analytics;
pub mod cleanup;
pub mod health;
pub mod manage;
pub mod rdp_info;
pub mod sessions;
pub mod ws;
