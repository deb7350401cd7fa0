//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, KeyError, TokenError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Business rule violation: {message}")]
    BusinessRule { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

impl DomainError {
    /// Shorthand for persistence and other infrastructure failures
    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        DomainError::NotFound {
            resource: resource.into(),
        }
    }

    /// True for errors caused by the caller's credentials rather than the server
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            DomainError::Auth(AuthError::InvalidCredentials) | DomainError::Token(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
