//! Role-based authorization
//!
//! Roles are read from persistence on every check while the role to
//! (resource, action) grants are served from an in-memory policy cache that
//! is rebuilt after each mutation of the relation.

mod engine;
mod policy;
mod seed;

#[cfg(test)]
mod tests;

pub use engine::AuthorizationEngine;
pub use policy::PolicyCache;
pub use seed::{DefaultPermission, DEFAULT_PERMISSIONS, DEFAULT_ROLES};
