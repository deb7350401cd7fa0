pub mod auth;
pub mod rbac;

pub use caa_shared::ErrorResponse;
