//! User entity consumed by the authentication flows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account setup status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered but has not finished initial setup
    PendingSetup,
    Active,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::PendingSetup => "pending_setup",
            UserStatus::Active => "active",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_setup" => Ok(UserStatus::PendingSetup),
            "active" => Ok(UserStatus::Active),
            other => Err(format!("Invalid user status: {}", other)),
        }
    }
}

/// User entity representing a registered user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier; the identity carried by access tokens
    pub id: Uuid,

    pub username: String,

    /// bcrypt hash of the login password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// bcrypt hash of the editor password
    #[serde(skip_serializing)]
    pub editor_password_hash: String,

    pub status: UserStatus,

    /// Deactivated accounts cannot log in
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user in the `pending_setup` state
    pub fn new(username: String, password_hash: String, editor_password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            editor_password_hash,
            status: UserStatus::PendingSetup,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("status", &self.status)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}
