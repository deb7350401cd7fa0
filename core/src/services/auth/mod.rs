//! Authentication service module
//!
//! This module provides password authentication including:
//! - User registration and login with bcrypt-hashed credentials
//! - Refresh token rotation and revocation
//! - Logout from every session
//! - Editor password checks for privileged actions

mod config;
mod password;
mod service;

#[cfg(test)]
mod tests;

pub use config::AuthServiceConfig;
pub use password::{hash_password, verify_password, MAX_PASSWORD_BYTES};
pub use service::AuthService;
