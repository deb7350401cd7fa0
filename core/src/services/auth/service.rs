//! Main authentication service implementation

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::token::TokenPair;
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::{
    InMemoryRbacRepository, RbacRepository, RefreshTokenRepository, SigningKeyRepository,
    UserRepository,
};
use crate::services::rbac::AuthorizationEngine;
use crate::services::token::{hash_refresh_secret, TokenService};

use super::config::AuthServiceConfig;
use super::password::{hash_password, verify_password, MAX_PASSWORD_BYTES};

/// Input for the hash that failed logins without a stored hash verify against
const TIMING_PASSWORD: &str = "caa-timing-placeholder";

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.@-]{3,50}$").unwrap()
});

/// Authentication service for the password login flow
///
/// Without an authorization engine, registration skips the default role
/// assignment and everything else works the same.
pub struct AuthService<U, R, K, B = InMemoryRbacRepository>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    K: SigningKeyRepository,
    B: RbacRepository,
{
    /// User repository for account lookups
    user_repository: Arc<U>,
    /// Server-side refresh token records
    refresh_tokens: Arc<R>,
    /// Token service for JWT management
    token_service: Arc<TokenService<K>>,
    /// Optional engine used to give new users their default role
    authorization: Option<Arc<AuthorizationEngine<B>>>,
    /// Service configuration
    config: AuthServiceConfig,
    /// Hash at the configured cost, built on the first failed lookup
    timing_hash: OnceCell<String>,
}

impl<U, R, K, B> AuthService<U, R, K, B>
where
    U: UserRepository,
    R: RefreshTokenRepository,
    K: SigningKeyRepository,
    B: RbacRepository,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `user_repository` - Repository for user data persistence
    /// * `refresh_tokens` - Repository for refresh token records
    /// * `token_service` - Service for JWT token management
    /// * `config` - Service configuration
    pub fn new(
        user_repository: Arc<U>,
        refresh_tokens: Arc<R>,
        token_service: Arc<TokenService<K>>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            refresh_tokens,
            token_service,
            authorization: None,
            config,
            timing_hash: OnceCell::new(),
        }
    }

    /// Create a new authentication service that assigns the default role on registration
    pub fn with_authorization(
        user_repository: Arc<U>,
        refresh_tokens: Arc<R>,
        token_service: Arc<TokenService<K>>,
        authorization: Arc<AuthorizationEngine<B>>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            refresh_tokens,
            token_service,
            authorization: Some(authorization),
            config,
            timing_hash: OnceCell::new(),
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService<K>> {
        &self.token_service
    }

    /// Register a new account and sign it in
    ///
    /// This method:
    /// 1. Validates the username and both passwords
    /// 2. Rejects taken usernames
    /// 3. Hashes both credentials with bcrypt
    /// 4. Stores the user in the `pending_setup` state
    /// 5. Assigns the default role when the authorization engine knows it
    /// 6. Issues an access token and a refresh token
    ///
    /// # Returns
    ///
    /// * `Ok((User, TokenPair))` - The new account and its first session
    /// * `Err(DomainError::Validation)` - Malformed username or password
    /// * `Err(AuthError::UserAlreadyExists)` - Username taken
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        editor_password: &str,
    ) -> Result<(User, TokenPair), DomainError> {
        let username = username.trim();
        validate_username(username)?;
        validate_password("password", password)?;
        validate_password("editor password", editor_password)?;

        if self.user_repository.exists_by_username(username).await? {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = hash_password(password, self.config.bcrypt_cost).await?;
        let editor_password_hash = hash_password(editor_password, self.config.bcrypt_cost).await?;

        let user = self
            .user_repository
            .create(User::new(
                username.to_string(),
                password_hash,
                editor_password_hash,
            ))
            .await?;
        info!(user_id = %user.id, "User registered");

        self.assign_default_role(user.id).await;

        let tokens = self.start_session(user.id).await?;
        Ok((user, tokens))
    }

    /// Authenticate with username and password
    ///
    /// Unknown users, deactivated users and wrong passwords all produce the
    /// same `InvalidCredentials` error after one bcrypt verification.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, TokenPair), DomainError> {
        let user = match self.user_repository.find_by_username(username.trim()).await? {
            Some(user) => user,
            None => {
                debug!("Login attempt for unknown username");
                self.verify_against_timing_hash(password).await?;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt for deactivated user");
            self.verify_against_timing_hash(password).await?;
            return Err(AuthError::InvalidCredentials.into());
        }

        if !verify_password(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.start_session(user.id).await?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, tokens))
    }

    /// Exchange a refresh secret for a new token pair
    ///
    /// The presented secret is consumed: its record is replaced by the new
    /// one in a single repository operation, so it can never be used twice.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Fresh access token and refresh secret
    /// * `Err(TokenError::InvalidToken)` - Unknown or already used secret, or the owner is gone
    /// * `Err(TokenError::TokenExpired)` - The secret expired; its record is deleted
    pub async fn refresh_token(&self, refresh_secret: &str) -> Result<TokenPair, DomainError> {
        let token_hash = hash_refresh_secret(refresh_secret);

        let record = self
            .refresh_tokens
            .find_any_by_token(&token_hash)
            .await?
            .ok_or(TokenError::InvalidToken)?;

        if record.is_expired() {
            self.refresh_tokens.delete(&token_hash).await?;
            debug!(user_id = %record.user_id, "Expired refresh token presented");
            return Err(TokenError::TokenExpired.into());
        }

        match self.user_repository.find_by_id(record.user_id).await? {
            Some(user) if user.is_active => {}
            _ => {
                self.refresh_tokens.delete(&token_hash).await?;
                warn!(user_id = %record.user_id, "Refresh token for missing or deactivated user");
                return Err(TokenError::InvalidToken.into());
            }
        }

        let (tokens, new_record) = self.token_service.issue_token_pair(record.user_id).await?;
        self.refresh_tokens.rotate(&token_hash, &new_record).await?;

        debug!(user_id = %record.user_id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Revoke a single refresh secret
    ///
    /// # Returns
    ///
    /// * `Err(TokenError::InvalidToken)` - No such secret
    pub async fn revoke_refresh_token(&self, refresh_secret: &str) -> Result<(), DomainError> {
        let token_hash = hash_refresh_secret(refresh_secret);
        if !self.refresh_tokens.delete(&token_hash).await? {
            return Err(TokenError::InvalidToken.into());
        }
        debug!("Refresh token revoked");
        Ok(())
    }

    /// End every session of the user, returning how many refresh tokens were deleted
    pub async fn logout(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let deleted = self.refresh_tokens.delete_by_user_id(user_id).await?;
        info!(user_id = %user_id, sessions = deleted, "User logged out");
        Ok(deleted)
    }

    /// Check the user's editor password
    ///
    /// Unknown and deactivated users simply fail the check.
    pub async fn validate_editor_password(
        &self,
        user_id: Uuid,
        editor_password: &str,
    ) -> Result<bool, DomainError> {
        let user = match self.user_repository.find_by_id(user_id).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(false),
        };

        let valid = verify_password(editor_password, &user.editor_password_hash).await?;
        if !valid {
            warn!(user_id = %user_id, "Editor password check failed");
        }
        Ok(valid)
    }

    /// Load the authenticated user's account
    ///
    /// # Returns
    ///
    /// * `Err(AuthError::UserNotFound)` - The token outlived the account
    pub async fn get_current_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound.into())
    }

    async fn start_session(&self, user_id: Uuid) -> Result<TokenPair, DomainError> {
        let (tokens, record) = self.token_service.issue_token_pair(user_id).await?;
        self.refresh_tokens.create(&record).await?;
        Ok(tokens)
    }

    /// Run the same bcrypt work as a real password check, discarding the result
    async fn verify_against_timing_hash(&self, password: &str) -> Result<(), DomainError> {
        let hash = self
            .timing_hash
            .get_or_try_init(|| hash_password(TIMING_PASSWORD, self.config.bcrypt_cost))
            .await?;
        verify_password(password, hash).await?;
        Ok(())
    }

    async fn assign_default_role(&self, user_id: Uuid) {
        let (Some(engine), Some(role)) = (&self.authorization, &self.config.default_role) else {
            return;
        };

        match engine.assign_role(user_id, role).await {
            Ok(()) => {}
            Err(DomainError::NotFound { .. }) => {
                warn!(user_id = %user_id, role = %role, "Default role does not exist, skipping");
            }
            Err(e) => {
                warn!(user_id = %user_id, role = %role, error = %e, "Failed to assign default role");
            }
        }
    }
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(DomainError::validation(
            "username must be 3-50 characters of letters, digits, '_', '.', '@' or '-'",
        ));
    }
    Ok(())
}

fn validate_password(field: &str, password: &str) -> Result<(), DomainError> {
    if password.is_empty() {
        return Err(DomainError::validation(format!("{} must not be empty", field)));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(DomainError::validation(format!(
            "{} must be at most {} bytes",
            field, MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}
