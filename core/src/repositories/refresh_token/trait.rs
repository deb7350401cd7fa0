//! Refresh token repository trait defining the interface for session persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::refresh_token::RefreshToken;
use crate::errors::DomainError;

/// Repository trait for RefreshToken persistence operations
///
/// All lookups are by the SHA-256 digest of the secret. Rows are deleted,
/// never flagged: a deleted row is indistinguishable from one that never
/// existed.
///
/// # Security Considerations
/// - Only token hashes are stored
/// - Expired rows are swept periodically with `delete_expired`
/// - Rotation deletes the consumed row in the same transaction that inserts its successor
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Insert a new refresh token
    ///
    /// # Returns
    /// * `Ok(())` - Token stored
    /// * `Err(DomainError::Internal)` - Hash collision or persistence failure
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::Duration;
    /// # use uuid::Uuid;
    /// # use caa_core::repositories::RefreshTokenRepository;
    /// # use caa_core::domain::entities::RefreshToken;
    /// # async fn example(repo: &impl RefreshTokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let token = RefreshToken::new(Uuid::new_v4(), "sha256_hex".to_string(), Duration::days(7));
    /// repo.create(&token).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn create(&self, token: &RefreshToken) -> Result<(), DomainError>;

    /// Find a non-expired token by hash
    ///
    /// # Returns
    /// * `Ok(Some(RefreshToken))` - Token found and still valid
    /// * `Ok(None)` - Unknown or expired
    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError>;

    /// Find a token by hash whether or not it has expired
    async fn find_any_by_token(&self, token_hash: &str)
        -> Result<Option<RefreshToken>, DomainError>;

    /// Non-expired tokens owned by a user
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshToken>, DomainError>;

    /// Delete every token owned by a user, returning how many were removed
    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, DomainError>;

    /// Delete a single token
    ///
    /// # Returns
    /// * `Ok(true)` - Token deleted
    /// * `Ok(false)` - No token with that hash
    async fn delete(&self, token_hash: &str) -> Result<bool, DomainError>;

    /// Delete all expired tokens, returning how many were removed
    async fn delete_expired(&self) -> Result<u64, DomainError>;

    /// Replace a consumed token with its successor in one transaction
    ///
    /// # Returns
    /// * `Ok(())` - Old row deleted and new row inserted
    /// * `Err(DomainError::Token(TokenError::InvalidToken))` - Old row already gone (reuse)
    /// * `Err(DomainError::Internal)` - Insert failed; the old row is left untouched
    async fn rotate(&self, old_token_hash: &str, new_token: &RefreshToken)
        -> Result<(), DomainError>;

    /// Count active sessions for a user
    async fn count_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let tokens = self.find_by_user_id(user_id).await?;
        Ok(tokens.len())
    }
}
