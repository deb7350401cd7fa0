//! HTTP server configuration

use serde::{Deserialize, Serialize};

use super::env_or;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or(defaults.host),
            port: env_or("SERVER_PORT", defaults.port),
        }
    }

    /// Socket address string used by the HTTP server bind call
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
