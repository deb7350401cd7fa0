//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - RSA-signed access token issuance and verification with `kid` headers
//! - Bearer token extraction from requests
//! - Refresh secret generation and hashing
//! - Background cleanup of expired refresh tokens

mod cleanup;
mod config;
mod service;


pub use cleanup::{CleanupResult, RefreshTokenCleanupService};
pub use config::TokenServiceConfig;
pub use service::{
    extract_token, hash_refresh_secret, TokenService, REFRESH_SECRET_BYTES, TOKEN_QUERY_PARAM,
};
