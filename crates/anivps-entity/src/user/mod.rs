//! User domain entities.
//!
//! Accounts live in the external authentication provider; only the role
//! carried in the bearer token is modelled here.

pub mod role;

pub use role::UserRole;
