//! Domain entities representing core business objects.

pub mod rbac;
pub mod refresh_token;
pub mod signing_key;
pub mod token;
pub mod user;

pub use rbac::{
    Permission, Role, RolePermission, UserRole, ROLE_ADMIN, ROLE_EDITOR, ROLE_USER,
};
pub use refresh_token::RefreshToken;
pub use signing_key::{
    SigningAlgorithm, SigningKey, SigningKeyStatus, KEY_CLEANUP_GRACE_DAYS,
};
pub use token::{
    Claims, TokenPair, ACCESS_TOKEN_EXPIRY_MINUTES, REFRESH_TOKEN_EXPIRY_DAYS,
};
pub use user::{User, UserStatus};
