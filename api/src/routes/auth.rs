//! Authentication route handlers
//!
//! Public: register, login, refresh, revoke. Behind `JwtAuth`: logout, me,
//! editor-password.

use actix_web::{web, HttpResponse};
use caa_core::repositories::{
    RbacRepository, RefreshTokenRepository, SigningKeyRepository, UserRepository,
};
use validator::Validate;

use crate::dto::auth::{
    AuthResponse, EditorPasswordRequest, EditorPasswordResponse, LoginRequest, LogoutResponse,
    MessageResponse, RefreshTokenRequest, RegisterRequest, TokenResponse, UserResponse,
};
use crate::handlers::error::ApiError;
use crate::middleware::auth::AuthContext;

use super::AppState;

/// Handler for POST /api/v1/auth/register
///
/// # Response
///
/// ## Success (201 Created)
/// ```json
/// {
///     "user": { "id": "...", "username": "alice", "status": "pending_setup", ... },
///     "access_token": "...",
///     "refresh_token": "...",
///     "token_type": "Bearer",
///     "expires_in": 900,
///     "refresh_expires_at": "..."
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Malformed username or password
/// - 409 Conflict: Username taken
pub async fn register<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    let (user, tokens) = state
        .auth_service
        .register(
            &request.username,
            &request.password,
            &request.editor_password,
        )
        .await?;

    Ok(HttpResponse::Created().json(AuthResponse::new(user, tokens)))
}

/// Handler for POST /api/v1/auth/login
///
/// ## Errors
/// - 401 Unauthorized: Unknown username, wrong password or deactivated account
pub async fn login<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    let (user, tokens) = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(user, tokens)))
}

/// Handler for POST /api/v1/auth/refresh
///
/// The presented refresh token is consumed; the response carries its
/// replacement.
///
/// ## Errors
/// - 401 Unauthorized: Unknown, already used or expired refresh token
pub async fn refresh<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    let tokens = state
        .auth_service
        .refresh_token(&request.refresh_token)
        .await?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// Handler for POST /api/v1/auth/revoke
pub async fn revoke<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    state
        .auth_service
        .revoke_refresh_token(&request.refresh_token)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Refresh token revoked")))
}

/// Handler for POST /api/v1/auth/logout
///
/// Deletes every refresh token of the caller. Access tokens already issued
/// stay valid until they expire.
pub async fn logout<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let sessions_revoked = state.auth_service.logout(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(LogoutResponse {
        message: String::from("Logged out successfully"),
        sessions_revoked,
    }))
}

/// Handler for GET /api/v1/auth/me
pub async fn me<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    let user = state.auth_service.get_current_user(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Handler for POST /api/v1/auth/editor-password
///
/// A wrong editor password is a normal answer, not an error:
/// `{"success": false}` with 200.
pub async fn validate_editor_password<U, R, K, B>(
    state: web::Data<AppState<U, R, K, B>>,
    auth: AuthContext,
    request: web::Json<EditorPasswordRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    R: RefreshTokenRepository + 'static,
    K: SigningKeyRepository + 'static,
    B: RbacRepository + 'static,
{
    request.validate()?;

    let success = state
        .auth_service
        .validate_editor_password(auth.user_id, &request.editor_password)
        .await?;

    Ok(HttpResponse::Ok().json(EditorPasswordResponse { success }))
}
