//! Background processing for AniVPS.
//!
//! This crate provides:
//! - A provisioning runner that advances due sessions through dispatch and
//!   polling, one worker step per session per tick
//! - A cron scheduler running the janitor sweep

pub mod runner;
pub mod scheduler;

pub use runner::ProvisioningRunner;
pub use scheduler::CronScheduler;
