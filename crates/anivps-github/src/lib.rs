//! # anivps-github
//!
//! Thin, retryless driver over the GitHub REST endpoints that provision a
//! VPS session: repository creation, workflow upload, dispatch, run
//! listing, log download and cancellation.
//!
//! The bearer token is supplied on every call and never stored here.
//! Callers depend on the [`WorkflowDriver`] trait so test suites can stub
//! the provider entirely.

pub mod client;
pub mod driver;
pub mod error;
pub mod logs;
pub mod models;

pub use client::GitHubClient;
pub use driver::WorkflowDriver;
pub use error::GitHubError;
pub use models::{CancelOutcome, CommitRef, RepoHandle, WorkflowRun};
