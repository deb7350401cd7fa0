pub mod auth;
pub mod authorization;
pub mod cors;

pub use auth::{AccessTokenVerifier, AuthContext, JwtAuth};
pub use authorization::{PermissionChecker, RequirePermission, RequireRole};
pub use cors::create_cors;
