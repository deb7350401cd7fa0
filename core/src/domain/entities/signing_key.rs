//! RSA signing key entity used to sign and verify access tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, KeyError};

/// Expired keys are kept this long before cleanup deletes them
pub const KEY_CLEANUP_GRACE_DAYS: i64 = 7;

/// RSA signature algorithms accepted for access tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    RS256,
    RS384,
    RS512,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::RS256 => "RS256",
            SigningAlgorithm::RS384 => "RS384",
            SigningAlgorithm::RS512 => "RS512",
        }
    }

    /// The `jsonwebtoken` algorithm used for encoding and validation
    pub fn jwt_algorithm(&self) -> Algorithm {
        match self {
            SigningAlgorithm::RS256 => Algorithm::RS256,
            SigningAlgorithm::RS384 => Algorithm::RS384,
            SigningAlgorithm::RS512 => Algorithm::RS512,
        }
    }

    /// Maps a token header algorithm back, rejecting anything outside the RSA family
    pub fn from_jwt_algorithm(algorithm: Algorithm) -> Option<Self> {
        match algorithm {
            Algorithm::RS256 => Some(SigningAlgorithm::RS256),
            Algorithm::RS384 => Some(SigningAlgorithm::RS384),
            Algorithm::RS512 => Some(SigningAlgorithm::RS512),
            _ => None,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RS256" => Ok(SigningAlgorithm::RS256),
            "RS384" => Ok(SigningAlgorithm::RS384),
            "RS512" => Ok(SigningAlgorithm::RS512),
            other => Err(KeyError::InvalidKeyMaterial {
                message: format!("unsupported signing algorithm {}", other),
            }
            .into()),
        }
    }
}

/// Lifecycle status reported for a signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningKeyStatus {
    Active,
    Rotated,
    Inactive,
    Expired,
}

impl fmt::Display for SigningKeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            SigningKeyStatus::Active => "active",
            SigningKeyStatus::Rotated => "rotated",
            SigningKeyStatus::Inactive => "inactive",
            SigningKeyStatus::Expired => "expired",
        };
        f.write_str(status)
    }
}

/// A persisted RSA key pair
///
/// At most one key is active at any time. The private half never leaves the
/// key store except to build an encoding key for signing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    /// Row identifier
    pub id: Uuid,

    /// Public identifier placed in the `kid` token header
    pub key_id: String,

    /// PKCS#1 PEM private key
    #[serde(skip_serializing)]
    pub private_key: String,

    /// SPKI PEM public key
    pub public_key: String,

    pub algorithm: SigningAlgorithm,

    /// RSA modulus size in bits
    pub key_size: usize,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Set when a newer key replaced this one
    pub rotated_at: Option<DateTime<Utc>>,
}

impl SigningKey {
    /// Creates a new inactive key from freshly generated PEM material
    pub fn new(
        private_key: String,
        public_key: String,
        algorithm: SigningAlgorithm,
        key_size: usize,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key_id: Uuid::new_v4().simple().to_string(),
            private_key,
            public_key,
            algorithm,
            key_size,
            is_active: false,
            created_at: Utc::now(),
            expires_at,
            rotated_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_rotated(&self) -> bool {
        self.rotated_at.is_some()
    }

    /// Only the active, unexpired key may sign
    pub fn is_valid_for_signing(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    /// Rotated keys still verify until they expire
    pub fn is_valid_for_verification(&self) -> bool {
        !self.is_expired()
    }

    /// True once the key has been expired longer than the cleanup grace window
    pub fn is_past_cleanup_grace(&self) -> bool {
        Utc::now() > self.expires_at + Duration::days(KEY_CLEANUP_GRACE_DAYS)
    }

    pub fn status(&self) -> SigningKeyStatus {
        if self.is_expired() {
            SigningKeyStatus::Expired
        } else if self.is_active {
            SigningKeyStatus::Active
        } else if self.is_rotated() {
            SigningKeyStatus::Rotated
        } else {
            SigningKeyStatus::Inactive
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("key_size", &self.key_size)
            .field("is_active", &self.is_active)
            .field("expires_at", &self.expires_at)
            .field("rotated_at", &self.rotated_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_expiring_in(duration: Duration) -> SigningKey {
        SigningKey::new(
            "private".to_string(),
            "public".to_string(),
            SigningAlgorithm::RS256,
            2048,
            Utc::now() + duration,
        )
    }

    #[test]
    fn test_new_key_is_inactive() {
        let key = key_expiring_in(Duration::days(30));
        assert!(!key.is_active);
        assert!(!key.is_rotated());
        assert_eq!(key.status(), SigningKeyStatus::Inactive);
        assert_eq!(key.key_id.len(), 32);
    }

    #[test]
    fn test_status_transitions() {
        let mut key = key_expiring_in(Duration::days(30));
        key.is_active = true;
        assert_eq!(key.status(), SigningKeyStatus::Active);
        assert!(key.is_valid_for_signing());

        key.is_active = false;
        key.rotated_at = Some(Utc::now());
        assert_eq!(key.status(), SigningKeyStatus::Rotated);
        assert!(!key.is_valid_for_signing());
        assert!(key.is_valid_for_verification());

        key.expires_at = Utc::now() - Duration::seconds(1);
        assert_eq!(key.status(), SigningKeyStatus::Expired);
        assert!(!key.is_valid_for_verification());
    }

    #[test]
    fn test_cleanup_grace_window() {
        let key = key_expiring_in(-Duration::days(3));
        assert!(key.is_expired());
        assert!(!key.is_past_cleanup_grace());

        let key = key_expiring_in(-Duration::days(KEY_CLEANUP_GRACE_DAYS + 1));
        assert!(key.is_past_cleanup_grace());
    }

    #[test]
    fn test_algorithm_family() {
        assert_eq!("rs384".parse::<SigningAlgorithm>().ok(), Some(SigningAlgorithm::RS384));
        assert!("HS256".parse::<SigningAlgorithm>().is_err());
        assert_eq!(SigningAlgorithm::from_jwt_algorithm(Algorithm::HS256), None);
        assert_eq!(SigningAlgorithm::from_jwt_algorithm(Algorithm::ES256), None);
        assert_eq!(
            SigningAlgorithm::from_jwt_algorithm(Algorithm::RS512),
            Some(SigningAlgorithm::RS512)
        );
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key = key_expiring_in(Duration::days(1));
        let debug = format!("{:?}", key);
        assert!(!debug.contains("private_key"));
        assert!(debug.contains(&key.key_id));
    }
}
