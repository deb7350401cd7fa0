//! RSA key pair generation and conversion into JWT keys

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::domain::entities::signing_key::{SigningAlgorithm, SigningKey};
use crate::errors::{DomainError, KeyError};

/// PEM-encoded halves of a freshly generated key pair
pub struct KeyPairPem {
    /// PKCS#1 (`RSA PRIVATE KEY`)
    pub private_key: String,
    /// SPKI (`PUBLIC KEY`)
    pub public_key: String,
}

/// Generate an RSA key pair of `bits` size
///
/// CPU-bound; async callers should go through [`generate_signing_key`].
pub fn generate_key_pair(bits: usize) -> Result<KeyPairPem, DomainError> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, bits).map_err(|e| {
        KeyError::KeyGenerationFailed {
            message: e.to_string(),
        }
    })?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key.to_pkcs1_pem(LineEnding::LF).map_err(|e| {
        KeyError::KeyGenerationFailed {
            message: format!("failed to encode private key: {}", e),
        }
    })?;
    let public_pem = public_key.to_public_key_pem(LineEnding::LF).map_err(|e| {
        KeyError::KeyGenerationFailed {
            message: format!("failed to encode public key: {}", e),
        }
    })?;

    Ok(KeyPairPem {
        private_key: private_pem.to_string(),
        public_key: public_pem,
    })
}

/// Generate a new inactive [`SigningKey`] off the async executor
pub async fn generate_signing_key(
    key_size: usize,
    algorithm: SigningAlgorithm,
    expires_at: DateTime<Utc>,
) -> Result<SigningKey, DomainError> {
    let pair = tokio::task::spawn_blocking(move || generate_key_pair(key_size))
        .await
        .map_err(|e| KeyError::KeyGenerationFailed {
            message: format!("key generation task failed: {}", e),
        })??;

    Ok(SigningKey::new(
        pair.private_key,
        pair.public_key,
        algorithm,
        key_size,
        expires_at,
    ))
}

/// Signing half of a stored key
pub fn encoding_key(key: &SigningKey) -> Result<EncodingKey, DomainError> {
    EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
        KeyError::InvalidKeyMaterial {
            message: format!("invalid private key {}: {}", key.key_id, e),
        }
        .into()
    })
}

/// Verification half of a stored key
pub fn decoding_key(key: &SigningKey) -> Result<DecodingKey, DomainError> {
    DecodingKey::from_rsa_pem(key.public_key.as_bytes()).map_err(|e| {
        KeyError::InvalidKeyMaterial {
            message: format!("invalid public key {}: {}", key.key_id, e),
        }
        .into()
    })
}
