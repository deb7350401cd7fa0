//! Domain-specific error types for authentication, tokens and signing keys
//!
//! Messages are intentionally generic. The presentation layer decides which
//! variants may be shown to a caller and maps them to HTTP status codes.

use thiserror::Error;

/// Authentication and authorization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password; the two are never distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, unknown or already-consumed token
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Tampered token or token signed by a key we do not trust
    #[error("Invalid signature")]
    InvalidSignature,

    /// No bearer token in the request
    #[error("Token not found")]
    TokenNotFound,

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Signing-key management errors
///
/// These indicate a broken key-management invariant and surface as internal
/// errors; the next signing attempt self-heals through `ensure_valid_key`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Signing key not found: {key_id}")]
    KeyNotFound { key_id: String },

    #[error("No active signing key")]
    NoActiveKey,

    #[error("Signing key expired: {key_id}")]
    KeyExpired { key_id: String },

    #[error("Signing key generation failed: {message}")]
    KeyGenerationFailed { message: String },

    #[error("Invalid key material: {message}")]
    InvalidKeyMaterial { message: String },
}
