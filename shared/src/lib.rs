//! Shared configuration and common types for the CAA server
//!
//! - Configuration types loaded from the environment
//! - The error response body returned by every API endpoint

pub mod config;
pub mod errors;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, Environment, LoggingConfig,
    ServerConfig,
};
pub use errors::{error_codes, ErrorResponse};
