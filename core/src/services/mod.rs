//! Business services containing authentication and authorization logic.

pub mod auth;
pub mod rbac;
pub mod signing_key;
pub mod token;

// Re-export commonly used types
pub use auth::{AuthService, AuthServiceConfig};
pub use rbac::AuthorizationEngine;
pub use signing_key::{KeyRotationScheduler, SigningKeyManager, SigningKeyManagerConfig};
pub use token::{
    extract_token, CleanupResult, RefreshTokenCleanupService, TokenService, TokenServiceConfig,
};
