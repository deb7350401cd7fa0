//! Configuration for the token service

use chrono::Duration;

use caa_shared::config::AuthConfig;

use crate::domain::entities::signing_key::SigningAlgorithm;
use crate::domain::entities::token::{ACCESS_TOKEN_EXPIRY_MINUTES, REFRESH_TOKEN_EXPIRY_DAYS};
use crate::errors::DomainError;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// The only algorithm accepted when validating tokens
    pub algorithm: SigningAlgorithm,
    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            algorithm: SigningAlgorithm::RS256,
            access_token_expiry_minutes: ACCESS_TOKEN_EXPIRY_MINUTES,
            refresh_token_expiry_days: REFRESH_TOKEN_EXPIRY_DAYS,
        }
    }
}

impl TokenServiceConfig {
    pub fn from_shared(config: &AuthConfig) -> Result<Self, DomainError> {
        Ok(Self {
            algorithm: config.signing_keys.algorithm.parse()?,
            access_token_expiry_minutes: config.tokens.access_token_expiry_minutes,
            refresh_token_expiry_days: config.tokens.refresh_token_expiry_days,
        })
    }

    pub fn access_token_lifetime(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_minutes)
    }

    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::days(self.refresh_token_expiry_days)
    }
}
