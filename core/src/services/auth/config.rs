//! Configuration for the authentication service

use caa_shared::config::AuthConfig;

use crate::domain::entities::rbac::ROLE_USER;

/// Configuration for the authentication service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// bcrypt work factor for both credentials
    pub bcrypt_cost: u32,
    /// Role assigned to newly registered users when it exists
    pub default_role: Option<String>,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            default_role: Some(ROLE_USER.to_string()),
        }
    }
}

impl AuthServiceConfig {
    pub fn from_shared(config: &AuthConfig) -> Self {
        Self {
            bcrypt_cost: config.password.bcrypt_cost,
            ..Self::default()
        }
    }
}
