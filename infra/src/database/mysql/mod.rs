//! MySQL implementations of the core repository traits
//!
//! UUIDs are stored as `CHAR(36)` strings and timestamps as UTC
//! `TIMESTAMP(6)`. Every SQLx error surfaces as `DomainError::Internal`.

mod rbac_repository_impl;
mod refresh_token_repository_impl;
mod rows;
mod signing_key_repository_impl;
mod user_repository_impl;

#[cfg(test)]
mod tests;

pub use rbac_repository_impl::MySqlRbacRepository;
pub use refresh_token_repository_impl::MySqlRefreshTokenRepository;
pub use signing_key_repository_impl::MySqlSigningKeyRepository;
pub use user_repository_impl::MySqlUserRepository;
