//! Configuration for the signing key manager

use std::time::Duration;

use caa_shared::config::SigningKeyConfig;

use crate::domain::entities::signing_key::SigningAlgorithm;
use crate::errors::DomainError;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Configuration for the signing key manager
#[derive(Debug, Clone)]
pub struct SigningKeyManagerConfig {
    /// RSA modulus size in bits
    pub key_size: usize,
    /// Algorithm new keys are created for
    pub algorithm: SigningAlgorithm,
    /// Key lifetime; the scheduler rotates at 80% of it
    pub rotation_period: Duration,
}

impl Default for SigningKeyManagerConfig {
    fn default() -> Self {
        Self {
            key_size: 2048,
            algorithm: SigningAlgorithm::RS256,
            rotation_period: Duration::from_secs(30 * SECONDS_PER_DAY),
        }
    }
}

impl SigningKeyManagerConfig {
    /// Build from the shared configuration, rejecting unsupported algorithms
    pub fn from_shared(config: &SigningKeyConfig) -> Result<Self, DomainError> {
        Ok(Self {
            key_size: config.key_size,
            algorithm: config.algorithm.parse()?,
            rotation_period: Duration::from_secs(u64::from(config.rotation_days) * SECONDS_PER_DAY),
        })
    }

    /// Interval between scheduled rotations
    pub fn rotation_interval(&self) -> Duration {
        self.rotation_period.mul_f64(0.8)
    }

    /// Key lifetime as a chrono duration for `expires_at` arithmetic
    pub fn key_lifetime(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.rotation_period)
            .unwrap_or_else(|_| chrono::Duration::days(30))
    }
}
