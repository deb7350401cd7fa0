//! Access-token claims and the token pair handed to clients.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiration time (7 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Claims structure for the JWT payload
///
/// The wire format is `{"user_id": "<uuid>", "iat": <unix>, "exp": <unix>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user ID
    pub user_id: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

impl Claims {
    /// Creates claims for an access token valid for `lifetime` from now
    pub fn new_access_token(user_id: Uuid, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Parses the subject back into a UUID
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.user_id)
    }
}

/// Token pair returned to the client after register, login or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Opaque refresh secret
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// When the refresh token stops being accepted
    pub refresh_expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_lifetime() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new_access_token(user_id, Duration::minutes(15));

        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.user_id().ok(), Some(user_id));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = Claims {
            user_id: "42".to_string(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["user_id"], "42");
        assert_eq!(json["iat"], 1);
        assert_eq!(json["exp"], 2);
        assert!(claims.user_id().is_err());
        assert!(claims.is_expired());
    }
}
