//! # CAA Core
//!
//! Authentication and authorization core: RSA signing keys with scheduled
//! rotation, access and refresh tokens, password authentication and
//! role-based access control. This crate holds the domain entities,
//! services, repository interfaces and error types; persistence and HTTP
//! live in the infrastructure and API crates.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use errors::{AuthError, DomainError, DomainResult, KeyError, TokenError};
