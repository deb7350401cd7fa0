//! Authentication and authorization configuration
//!
//! Every value here has a production default matching the deployed service,
//! and can be overridden through environment variables.

use serde::{Deserialize, Serialize};

use super::{env_or, ConfigError};

/// Algorithms accepted for access-token signing
pub const SUPPORTED_ALGORITHMS: [&str; 3] = ["RS256", "RS384", "RS512"];

/// Smallest RSA modulus accepted for signing keys
pub const MIN_KEY_SIZE: usize = 2048;

/// RSA signing-key configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SigningKeyConfig {
    /// RSA modulus size in bits
    pub key_size: usize,

    /// JWT algorithm name (RS256, RS384 or RS512)
    pub algorithm: String,

    /// Lifetime of a signing key in days; rotation happens at 80% of it
    pub rotation_days: u32,
}

impl Default for SigningKeyConfig {
    fn default() -> Self {
        Self {
            key_size: 2048,
            algorithm: String::from("RS256"),
            rotation_days: 30,
        }
    }
}

impl SigningKeyConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            key_size: env_or("RSA_KEY_SIZE", defaults.key_size),
            algorithm: std::env::var("RSA_ALGORITHM")
                .map(|value| value.trim().to_uppercase())
                .unwrap_or(defaults.algorithm),
            rotation_days: env_or("RSA_KEY_ROTATION_DAYS", defaults.rotation_days),
        }
    }
}

/// Access and refresh token lifetimes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Access token lifetime in minutes
    pub access_token_expiry_minutes: i64,

    /// Refresh token lifetime in days
    pub refresh_token_expiry_days: i64,

    /// Interval between expired refresh-token sweeps in minutes
    pub cleanup_interval_minutes: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
            cleanup_interval_minutes: 60,
        }
    }
}

impl TokenConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token_expiry_minutes: env_or(
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                defaults.access_token_expiry_minutes,
            ),
            refresh_token_expiry_days: env_or(
                "REFRESH_TOKEN_EXPIRY_DAYS",
                defaults.refresh_token_expiry_days,
            ),
            cleanup_interval_minutes: env_or(
                "REFRESH_TOKEN_CLEANUP_INTERVAL_MINUTES",
                defaults.cleanup_interval_minutes,
            ),
        }
    }
}

/// Credential hashing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PasswordConfig {
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 12 }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    pub signing_keys: SigningKeyConfig,
    pub tokens: TokenConfig,
    pub password: PasswordConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            signing_keys: SigningKeyConfig::from_env(),
            tokens: TokenConfig::from_env(),
            password: PasswordConfig {
                bcrypt_cost: env_or("BCRYPT_COST", PasswordConfig::default().bcrypt_cost),
            },
        }
    }

    /// Reject settings the auth core cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_keys.key_size < MIN_KEY_SIZE {
            return Err(ConfigError::invalid(
                "RSA_KEY_SIZE",
                format!("must be at least {} bits", MIN_KEY_SIZE),
            ));
        }
        if !SUPPORTED_ALGORITHMS.contains(&self.signing_keys.algorithm.as_str()) {
            return Err(ConfigError::invalid(
                "RSA_ALGORITHM",
                format!("must be one of {}", SUPPORTED_ALGORITHMS.join(", ")),
            ));
        }
        if self.signing_keys.rotation_days == 0 {
            return Err(ConfigError::invalid("RSA_KEY_ROTATION_DAYS", "must be positive"));
        }
        if self.tokens.access_token_expiry_minutes <= 0 {
            return Err(ConfigError::invalid(
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                "must be positive",
            ));
        }
        if self.tokens.refresh_token_expiry_days <= 0 {
            return Err(ConfigError::invalid("REFRESH_TOKEN_EXPIRY_DAYS", "must be positive"));
        }
        if self.tokens.cleanup_interval_minutes == 0 {
            return Err(ConfigError::invalid(
                "REFRESH_TOKEN_CLEANUP_INTERVAL_MINUTES",
                "must be positive",
            ));
        }
        if !(4..=31).contains(&self.password.bcrypt_cost) {
            return Err(ConfigError::invalid("BCRYPT_COST", "must be between 4 and 31"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuthConfig::default();
        assert_eq!(config.signing_keys.key_size, 2048);
        assert_eq!(config.signing_keys.algorithm, "RS256");
        assert_eq!(config.signing_keys.rotation_days, 30);
        assert_eq!(config.tokens.access_token_expiry_minutes, 15);
        assert_eq!(config.tokens.refresh_token_expiry_days, 7);
        assert_eq!(config.password.bcrypt_cost, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_symmetric_algorithm() {
        let mut config = AuthConfig::default();
        config.signing_keys.algorithm = "HS256".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref key, .. }) if key == "RSA_ALGORITHM"
        ));
    }

    #[test]
    fn test_rejects_small_keys_and_bad_cost() {
        let mut config = AuthConfig::default();
        config.signing_keys.key_size = 1024;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::default();
        config.password.bcrypt_cost = 3;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::default();
        config.signing_keys.rotation_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_cleanup_interval() {
        let mut config = AuthConfig::default();
        config.tokens.cleanup_interval_minutes = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref key, .. })
                if key == "REFRESH_TOKEN_CLEANUP_INTERVAL_MINUTES"
        ));
    }
}
