//! Mapping from domain errors to HTTP responses
//!
//! Every failure leaves the API as an [`ErrorResponse`] JSON body. Internal
//! and key-management failures are logged here and reach the caller only as
//! a generic message.

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use caa_core::errors::{AuthError, DomainError, TokenError};
use caa_shared::{error_codes, ErrorResponse};
use validator::ValidationErrors;

/// An error response ready to be returned from a handler or middleware
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::UNAUTHORIZED, message)
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            error_codes::FORBIDDEN,
            "Insufficient permissions",
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "An internal error occurred",
        )
    }

    /// Map a failure while authenticating a request
    ///
    /// Credential problems become a 401 and token errors keep their specific
    /// code. Server-side failures are logged and reported as a generic 500.
    pub fn unauthenticated(error: DomainError) -> Self {
        if !error.is_authentication_failure() {
            tracing::error!(error = %error, "Access token verification failed");
            return Self::internal();
        }
        match error {
            DomainError::Token(token_error) => token_error.into(),
            _ => Self::unauthorized("Authentication required"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.body.error, self.body.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(&self.body)
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::TokenExpired => Self::new(
                StatusCode::UNAUTHORIZED,
                error_codes::TOKEN_EXPIRED,
                "Token has expired",
            ),
            TokenError::InvalidToken | TokenError::InvalidSignature => Self::new(
                StatusCode::UNAUTHORIZED,
                error_codes::INVALID_TOKEN,
                "Invalid token",
            ),
            TokenError::TokenNotFound => Self::unauthorized("Authentication required"),
            TokenError::TokenGenerationFailed => {
                tracing::error!(error = %error, "Token generation failed");
                Self::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                error_codes::INVALID_CREDENTIALS,
                "Invalid username or password",
            ),
            AuthError::UserAlreadyExists => Self::new(
                StatusCode::CONFLICT,
                error_codes::CONFLICT,
                "Username is already taken",
            ),
            AuthError::UserNotFound => {
                Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "User not found")
            }
            AuthError::InsufficientPermissions => Self::forbidden(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message } => Self::new(
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                message,
            ),
            DomainError::BusinessRule { message } => {
                Self::new(StatusCode::CONFLICT, error_codes::CONFLICT, message)
            }
            DomainError::NotFound { resource } => Self::new(
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                format!("Not found: {}", resource),
            ),
            DomainError::Auth(auth_error) => auth_error.into(),
            DomainError::Token(token_error) => token_error.into(),
            error @ (DomainError::Key(_) | DomainError::Internal { .. }) => {
                tracing::error!(error = %error, "Request failed with an internal error");
                Self::internal()
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().into_keys().collect();
        fields.sort_unstable();
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            format!("Invalid fields: {}", fields.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caa_core::errors::KeyError;

    #[test]
    fn test_domain_error_status_codes() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (AuthError::UserAlreadyExists.into(), StatusCode::CONFLICT),
            (AuthError::InsufficientPermissions.into(), StatusCode::FORBIDDEN),
            (TokenError::TokenExpired.into(), StatusCode::UNAUTHORIZED),
            (TokenError::InvalidSignature.into(), StatusCode::UNAUTHORIZED),
            (DomainError::not_found("role x"), StatusCode::NOT_FOUND),
            (KeyError::NoActiveKey.into(), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::internal("db down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let description = error.to_string();
            assert_eq!(ApiError::from(error).status(), expected, "{}", description);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = ApiError::from(DomainError::internal("connection refused at 10.0.0.3"));
        assert_eq!(error.body().error, error_codes::INTERNAL_ERROR);
        assert!(!error.body().message.contains("10.0.0.3"));
    }

    #[test]
    fn test_unauthenticated_separates_credentials_from_server_failures() {
        let expired = ApiError::unauthenticated(TokenError::TokenExpired.into());
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.body().error, error_codes::TOKEN_EXPIRED);

        let missing = ApiError::unauthenticated(TokenError::TokenNotFound.into());
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let key_failure = ApiError::unauthenticated(KeyError::NoActiveKey.into());
        assert_eq!(key_failure.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(key_failure.body().error, error_codes::INTERNAL_ERROR);

        let db_down = ApiError::unauthenticated(DomainError::internal("pool timed out"));
        assert_eq!(db_down.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!db_down.body().message.contains("pool"));
    }
}
