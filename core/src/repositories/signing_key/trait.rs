//! Signing key repository trait defining the interface for RSA key persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::signing_key::{SigningAlgorithm, SigningKey};
use crate::errors::DomainError;

/// Repository trait for SigningKey persistence operations
///
/// The store is the single source of truth for which key is active, shared by
/// every server process. Implementations must keep at most one key active:
/// every mutation touching `is_active` runs in one transaction (or under one
/// exclusive lock for in-process stores).
#[async_trait]
pub trait SigningKeyRepository: Send + Sync {
    /// Generate a new RSA key pair and store it inactive
    ///
    /// # Arguments
    /// * `key_size` - RSA modulus size in bits
    /// * `algorithm` - Signature algorithm the key will be used with
    /// * `expires_at` - When the key stops being valid for signing and verification
    ///
    /// # Returns
    /// * `Ok(SigningKey)` - The stored key
    /// * `Err(DomainError)` - Key generation or persistence failed
    async fn create_key(
        &self,
        key_size: usize,
        algorithm: SigningAlgorithm,
        expires_at: DateTime<Utc>,
    ) -> Result<SigningKey, DomainError>;

    /// Atomically make `key_id` the only active key
    ///
    /// Every currently active key is deactivated and stamped with
    /// `rotated_at = now` before the target is activated.
    ///
    /// # Returns
    /// * `Ok(())` - The target is now the single active key
    /// * `Err(DomainError::Key(KeyError::KeyNotFound))` - Unknown key; nothing changed
    async fn activate_key(&self, key_id: &str) -> Result<(), DomainError>;

    /// The active key, failing with `KeyError::NoActiveKey` if none is active or it expired
    async fn get_active_key(&self) -> Result<SigningKey, DomainError>;

    /// Look up a key for verification
    ///
    /// Rotated keys are returned as long as they have not expired.
    ///
    /// # Returns
    /// * `Ok(SigningKey)` - Key found and unexpired
    /// * `Err(DomainError::Key(KeyError::KeyNotFound))` - Unknown key id
    /// * `Err(DomainError::Key(KeyError::KeyExpired))` - Key exists but expired
    async fn get_key_by_key_id(&self, key_id: &str) -> Result<SigningKey, DomainError>;

    /// All unexpired keys, newest first
    async fn get_valid_keys(&self) -> Result<Vec<SigningKey>, DomainError>;

    /// Force-expire the active key so the next signing attempt generates a new one
    ///
    /// # Returns
    /// Number of keys expired
    async fn expire_active_keys(&self) -> Result<u64, DomainError>;

    /// Delete keys that expired more than `KEY_CLEANUP_GRACE_DAYS` ago
    ///
    /// # Returns
    /// Number of keys deleted
    async fn cleanup_expired_keys(&self) -> Result<u64, DomainError>;

    /// Number of keys with `is_active = true`, expired or not
    async fn count_active_keys(&self) -> Result<u64, DomainError>;
}
