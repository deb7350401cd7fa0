//! User repository trait defining the interface for user data persistence.
//!
//! The user table is owned by the wider application; the auth core only
//! needs to create accounts and look them up.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with that ID
    /// * `Err(DomainError)` - Database error occurred
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Find a user by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Insert a new user
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(DomainError::Auth(AuthError::UserAlreadyExists))` - Username taken
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Check whether a username is taken
    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_username(username).await?.is_some())
    }
}
