//! Repository interfaces and in-memory implementations.
//!
//! MySQL implementations live in the infrastructure crate; the in-memory
//! stores back unit tests and single-process deployments.

pub mod rbac;
pub mod refresh_token;
pub mod signing_key;
pub mod user;

pub use rbac::{InMemoryRbacRepository, RbacRepository, RoleGrant};
pub use refresh_token::{InMemoryRefreshTokenRepository, RefreshTokenRepository};
pub use signing_key::{InMemorySigningKeyRepository, SigningKeyRepository};
pub use user::{InMemoryUserRepository, UserRepository};
