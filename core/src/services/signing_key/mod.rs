//! Signing key management for access tokens
//!
//! This module handles the RSA key lifecycle:
//! - Key pair generation and PEM encoding
//! - Ensuring exactly one valid active key exists
//! - On-demand and scheduled rotation with cleanup of long-expired keys

mod config;
mod key_material;
mod manager;
mod scheduler;


pub use config::SigningKeyManagerConfig;
pub use key_material::{decoding_key, encoding_key, generate_key_pair, generate_signing_key, KeyPairPem};
pub use manager::{SigningKeyManager, SigningMaterial};
pub use scheduler::KeyRotationScheduler;
