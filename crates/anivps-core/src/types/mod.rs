//! Shared types used across the AniVPS workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
