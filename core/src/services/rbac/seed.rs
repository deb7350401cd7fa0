//! Built-in roles, permissions and grants

use crate::domain::entities::rbac::{ROLE_ADMIN, ROLE_EDITOR, ROLE_USER};

/// (name, display name, description)
pub const DEFAULT_ROLES: &[(&str, &str, &str)] = &[
    (ROLE_ADMIN, "Administrator", "Full access to users, roles and content"),
    (ROLE_EDITOR, "Editor", "Manages all grids"),
    (ROLE_USER, "User", "Manages own grids"),
];

/// A built-in permission and the roles it is granted to
pub struct DefaultPermission {
    pub resource: &'static str,
    pub action: &'static str,
    pub display_name: &'static str,
    pub roles: &'static [&'static str],
}

const ADMIN_ONLY: &[&str] = &[ROLE_ADMIN];
const STAFF: &[&str] = &[ROLE_ADMIN, ROLE_EDITOR];
const OWNER: &[&str] = &[ROLE_EDITOR, ROLE_USER];
const EVERYONE: &[&str] = &[ROLE_ADMIN, ROLE_EDITOR, ROLE_USER];

const fn permission(
    resource: &'static str,
    action: &'static str,
    display_name: &'static str,
    roles: &'static [&'static str],
) -> DefaultPermission {
    DefaultPermission {
        resource,
        action,
        display_name,
        roles,
    }
}

pub const DEFAULT_PERMISSIONS: &[DefaultPermission] = &[
    permission("users", "read", "View users", ADMIN_ONLY),
    permission("users", "create", "Create users", ADMIN_ONLY),
    permission("users", "update", "Update users", ADMIN_ONLY),
    permission("users", "delete", "Delete users", ADMIN_ONLY),
    permission("roles", "read", "View roles", ADMIN_ONLY),
    permission("roles", "create", "Create roles", ADMIN_ONLY),
    permission("roles", "update", "Update roles", ADMIN_ONLY),
    permission("roles", "delete", "Delete roles", ADMIN_ONLY),
    permission("grids", "read", "View all grids", STAFF),
    permission("grids", "create", "Create grids", STAFF),
    permission("grids", "update", "Update any grid", STAFF),
    permission("grids", "delete", "Delete any grid", STAFF),
    permission("grids", "own", "Manage own grids", OWNER),
    permission("ai", "use", "Use AI features", EVERYONE),
    permission("system", "admin", "System administration", ADMIN_ONLY),
];
