//! In-process implementation of SigningKeyRepository
//!
//! A single write lock around the key table gives the same atomicity the
//! MySQL store gets from its transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::signing_key::{SigningAlgorithm, SigningKey};
use crate::errors::{DomainError, KeyError};
use crate::services::signing_key::generate_signing_key;

use super::r#trait::SigningKeyRepository;

/// In-memory signing key repository keyed by `key_id`
#[derive(Clone, Default)]
pub struct InMemorySigningKeyRepository {
    keys: Arc<RwLock<HashMap<String, SigningKey>>>,
}

impl InMemorySigningKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an already generated key as-is
    pub async fn insert(&self, key: SigningKey) {
        self.keys.write().await.insert(key.key_id.clone(), key);
    }

    /// Snapshot of every stored key, including expired ones
    pub async fn all_keys(&self) -> Vec<SigningKey> {
        self.keys.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl SigningKeyRepository for InMemorySigningKeyRepository {
    async fn create_key(
        &self,
        key_size: usize,
        algorithm: SigningAlgorithm,
        expires_at: DateTime<Utc>,
    ) -> Result<SigningKey, DomainError> {
        let key = generate_signing_key(key_size, algorithm, expires_at).await?;

        let mut keys = self.keys.write().await;
        if keys.contains_key(&key.key_id) {
            return Err(DomainError::internal(format!(
                "signing key id collision: {}",
                key.key_id
            )));
        }
        keys.insert(key.key_id.clone(), key.clone());
        Ok(key)
    }

    async fn activate_key(&self, key_id: &str) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;
        match keys.get(key_id) {
            None => {
                return Err(KeyError::KeyNotFound {
                    key_id: key_id.to_string(),
                }
                .into())
            }
            Some(key) if key.is_expired() => {
                return Err(KeyError::KeyExpired {
                    key_id: key_id.to_string(),
                }
                .into())
            }
            Some(_) => {}
        }

        let now = Utc::now();
        for key in keys.values_mut().filter(|key| key.is_active) {
            key.is_active = false;
            key.rotated_at = Some(now);
        }
        if let Some(target) = keys.get_mut(key_id) {
            target.is_active = true;
        }
        Ok(())
    }

    async fn get_active_key(&self) -> Result<SigningKey, DomainError> {
        let keys = self.keys.read().await;
        keys.values()
            .filter(|key| key.is_valid_for_signing())
            .max_by_key(|key| key.created_at)
            .cloned()
            .ok_or_else(|| KeyError::NoActiveKey.into())
    }

    async fn get_key_by_key_id(&self, key_id: &str) -> Result<SigningKey, DomainError> {
        let keys = self.keys.read().await;
        match keys.get(key_id) {
            Some(key) if key.is_valid_for_verification() => Ok(key.clone()),
            Some(_) => Err(KeyError::KeyExpired {
                key_id: key_id.to_string(),
            }
            .into()),
            None => Err(KeyError::KeyNotFound {
                key_id: key_id.to_string(),
            }
            .into()),
        }
    }

    async fn get_valid_keys(&self) -> Result<Vec<SigningKey>, DomainError> {
        let keys = self.keys.read().await;
        let mut valid: Vec<SigningKey> = keys
            .values()
            .filter(|key| key.is_valid_for_verification())
            .cloned()
            .collect();
        valid.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(valid)
    }

    async fn expire_active_keys(&self) -> Result<u64, DomainError> {
        let mut keys = self.keys.write().await;
        let now = Utc::now();
        let mut expired = 0;
        for key in keys.values_mut().filter(|key| key.is_active) {
            key.expires_at = now;
            expired += 1;
        }
        Ok(expired)
    }

    async fn cleanup_expired_keys(&self) -> Result<u64, DomainError> {
        let mut keys = self.keys.write().await;
        let before = keys.len();
        keys.retain(|_, key| !key.is_past_cleanup_grace());
        Ok((before - keys.len()) as u64)
    }

    async fn count_active_keys(&self) -> Result<u64, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.values().filter(|key| key.is_active).count() as u64)
    }
}
