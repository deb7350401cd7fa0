//! Refresh token entity stored in the database.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side record of an issued refresh secret
///
/// Only the SHA-256 digest of the secret is stored; the plain secret is
/// returned to the client once and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,

    /// Hex SHA-256 digest of the secret, unique
    pub token_hash: String,

    /// Owner of the session
    pub user_id: Uuid,

    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Creates a refresh token record expiring after `lifetime`
    pub fn new(user_id: Uuid, token_hash: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            token_hash,
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
