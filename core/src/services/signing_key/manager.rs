//! Signing key manager: the only component that creates or activates keys

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::{debug, info, warn};

use crate::domain::entities::signing_key::{SigningAlgorithm, SigningKey};
use crate::errors::{DomainError, KeyError};
use crate::repositories::SigningKeyRepository;

use super::config::SigningKeyManagerConfig;
use super::key_material::{decoding_key, encoding_key};

/// Everything needed to sign one access token
pub struct SigningMaterial {
    pub encoding_key: EncodingKey,
    pub key_id: String,
    pub algorithm: SigningAlgorithm,
}

/// Keeps a valid active signing key available and rotates it
///
/// The single-active-key invariant is enforced by the repository's
/// transaction, not by this type, so several processes may share one store.
pub struct SigningKeyManager<K: SigningKeyRepository> {
    repository: Arc<K>,
    config: SigningKeyManagerConfig,
}

impl<K: SigningKeyRepository> SigningKeyManager<K> {
    pub fn new(repository: Arc<K>, config: SigningKeyManagerConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &SigningKeyManagerConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<K> {
        &self.repository
    }

    /// Return the active key, creating and activating one if none is valid
    ///
    /// Called at startup and before every signing operation, so a missing or
    /// expired key heals itself on the next request.
    ///
    /// # Returns
    /// * `Ok(SigningKey)` - The active, unexpired key
    /// * `Err(DomainError)` - Key generation or persistence failed
    pub async fn ensure_valid_key(&self) -> Result<SigningKey, DomainError> {
        match self.repository.get_active_key().await {
            Ok(key) if key.is_valid_for_signing() => return Ok(key),
            Ok(key) => {
                warn!(key_id = %key.key_id, "Active signing key is no longer valid");
            }
            Err(DomainError::Key(KeyError::NoActiveKey)) => {
                info!("No active signing key found, generating a new one");
            }
            Err(e) => return Err(e),
        }

        self.create_and_activate().await
    }

    /// Create a new key, make it the active one, then clean up old keys
    ///
    /// The previously active key stays valid for verification until it expires.
    pub async fn rotate(&self) -> Result<SigningKey, DomainError> {
        info!("Rotating signing key");
        let key = self.create_and_activate().await?;

        match self.repository.cleanup_expired_keys().await {
            Ok(0) => {}
            Ok(count) => info!(deleted = count, "Removed expired signing keys"),
            Err(e) => warn!(error = %e, "Failed to clean up expired signing keys"),
        }

        Ok(key)
    }

    /// Rotate immediately, outside the regular schedule
    pub async fn force_rotate(&self) -> Result<SigningKey, DomainError> {
        warn!("Forced signing key rotation requested");
        self.rotate().await
    }

    /// Private key and `kid` for signing, resolved through [`Self::ensure_valid_key`]
    pub async fn get_signing_material(&self) -> Result<SigningMaterial, DomainError> {
        let key = self.ensure_valid_key().await?;
        Ok(SigningMaterial {
            encoding_key: encoding_key(&key)?,
            key_id: key.key_id,
            algorithm: key.algorithm,
        })
    }

    /// Public key for `key_id`; fails if the key is unknown or expired
    pub async fn get_verification_material(
        &self,
        key_id: &str,
    ) -> Result<DecodingKey, DomainError> {
        let key = self.repository.get_key_by_key_id(key_id).await?;
        if !key.is_valid_for_verification() {
            return Err(KeyError::KeyExpired {
                key_id: key.key_id,
            }
            .into());
        }
        decoding_key(&key)
    }

    /// Unexpired keys, newest first
    pub async fn get_valid_keys(&self) -> Result<Vec<SigningKey>, DomainError> {
        self.repository.get_valid_keys().await
    }

    async fn create_and_activate(&self) -> Result<SigningKey, DomainError> {
        let expires_at = Utc::now() + self.config.key_lifetime();
        let mut key = self
            .repository
            .create_key(self.config.key_size, self.config.algorithm, expires_at)
            .await?;
        debug!(key_id = %key.key_id, "Created signing key");

        self.repository.activate_key(&key.key_id).await?;
        key.is_active = true;

        info!(
            key_id = %key.key_id,
            algorithm = %key.algorithm,
            expires_at = %key.expires_at,
            "Activated signing key"
        );
        Ok(key)
    }
}
