use caa_core::domain::entities::{TokenPair, User, UserStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 3-50 characters of letters, digits, `_`, `.`, `@` or `-`
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(length(min = 1, max = 72))]
    pub password: String,

    /// Second credential gating editor-mode actions
    #[validate(length(min = 1, max = 72))]
    pub editor_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EditorPasswordRequest {
    #[validate(length(min = 1))]
    pub editor_password: String,
}

/// Public view of an account; never carries credential hashes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub status: UserStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            status: user.status,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: String::from("Bearer"),
            expires_in: pair.expires_in,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

impl AuthResponse {
    pub fn new(user: User, tokens: TokenPair) -> Self {
        Self {
            user: user.into(),
            tokens: tokens.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
    /// Refresh tokens deleted by this logout
    pub sessions_revoked: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorPasswordResponse {
    pub success: bool,
}
