//! # anivps-auth
//!
//! Verification of the bearer tokens issued by the external authentication
//! provider, and the access rules applied on top of them.
//!
//! ## Modules
//!
//! - `jwt`: HS256 claims, decoding and (for tooling and tests) encoding
//! - `rbac`: role and ownership checks
//! - `secret`: constant-time comparison of shared keys

pub mod jwt;
pub mod rbac;
pub mod secret;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use rbac::RbacEnforcer;
pub use secret::secrets_match;
