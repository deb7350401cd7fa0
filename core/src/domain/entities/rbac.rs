//! Role-based access control entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Built-in role names created by the default seed
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_USER: &str = "user";

/// A named bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Inactive roles grant nothing but keep their assignments
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: &str, display_name: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: normalize(name),
            display_name: display_name.trim().to_string(),
            description: description.trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single (resource, action) grant, also addressable as `resource:action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub resource: String,
    pub action: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a permission; name, resource and action are trimmed and lower-cased
    pub fn new(name: &str, display_name: &str, description: &str, resource: &str, action: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: normalize(name),
            display_name: display_name.trim().to_string(),
            description: description.trim().to_string(),
            resource: normalize(resource),
            action: normalize(action),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Conventional `resource:action` name
    pub fn qualified_name(resource: &str, action: &str) -> String {
        format!("{}:{}", normalize(resource), normalize(action))
    }

    pub fn grant(&self) -> (String, String) {
        (self.resource.clone(), self.action.clone())
    }
}

/// User to role assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl UserRole {
    pub fn new(user_id: Uuid, role_id: Uuid) -> Self {
        Self {
            user_id,
            role_id,
            created_at: Utc::now(),
        }
    }
}

/// Role to permission grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: Uuid,
    pub permission_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RolePermission {
    pub fn new(role_id: Uuid, permission_id: Uuid) -> Self {
        Self {
            role_id,
            permission_id,
            created_at: Utc::now(),
        }
    }
}

/// Canonical form for role names, permission names, resources and actions
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_is_normalized() {
        let permission = Permission::new(" Grids:Read ", "Read grids", "", " GRIDS", "Read ");
        assert_eq!(permission.name, "grids:read");
        assert_eq!(permission.resource, "grids");
        assert_eq!(permission.action, "read");
        assert_eq!(permission.grant(), ("grids".to_string(), "read".to_string()));
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(Permission::qualified_name("AI", "use"), "ai:use");
    }

    #[test]
    fn test_new_role_is_active() {
        let role = Role::new("Editor", "Editor", "Edits grids");
        assert_eq!(role.name, "editor");
        assert!(role.is_active);
    }
}
