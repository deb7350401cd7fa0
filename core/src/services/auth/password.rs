//! bcrypt hashing off the async executor

use tracing::warn;

use crate::errors::DomainError;

/// bcrypt only reads the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash `password` with the given cost on the blocking pool
pub async fn hash_password(password: &str, cost: u32) -> Result<String, DomainError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| DomainError::internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| DomainError::internal(format!("failed to hash password: {}", e)))
}

/// Check `password` against a stored bcrypt hash on the blocking pool
///
/// A malformed stored hash is a mismatch, not an error.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, DomainError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::internal(format!("password check task failed: {}", e)))?;

    match result {
        Ok(matches) => Ok(matches),
        Err(e) => {
            warn!(error = %e, "Stored password hash could not be parsed");
            Ok(false)
        }
    }
}
