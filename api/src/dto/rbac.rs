use caa_core::domain::entities::{Permission, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            display_name: role.display_name,
            description: role.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub resource: String,
    pub action: String,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id,
            name: permission.name,
            display_name: permission.display_name,
            description: permission.description,
            resource: permission.resource,
            action: permission.action,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, max = 50))]
    pub resource: String,

    #[validate(length(min = 1, max = 50))]
    pub action: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,
}

/// Query string of the permission check endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PermissionCheckQuery {
    #[validate(length(min = 1))]
    pub resource: String,

    #[validate(length(min = 1))]
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCheckResponse {
    pub user_id: Uuid,
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}
