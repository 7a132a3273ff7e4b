//! Session log entities.

pub mod model;

pub use model::{CreateSessionLog, LogType, SessionLogEntry};
