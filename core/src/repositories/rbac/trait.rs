//! RBAC repository trait for roles, permissions and their join tables.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::rbac::{Permission, Role};
use crate::errors::DomainError;

/// One row of the role to permission relation, joined with both sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: Role,
    pub permission: Permission,
}

/// Repository trait for the role/permission graph
///
/// The repository is a plain relational store: it returns inactive roles and
/// permissions too, and leaves filtering to the authorization engine.
/// Assignment methods are idempotent.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Insert a role
    ///
    /// # Returns
    /// * `Ok(Role)` - The stored role
    /// * `Err(DomainError::BusinessRule)` - A role with that name exists
    async fn create_role(&self, role: Role) -> Result<Role, DomainError>;

    /// Insert a permission
    ///
    /// # Returns
    /// * `Ok(Permission)` - The stored permission
    /// * `Err(DomainError::BusinessRule)` - Name or (resource, action) already taken
    async fn create_permission(&self, permission: Permission) -> Result<Permission, DomainError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DomainError>;

    async fn find_permission_by_name(&self, name: &str)
        -> Result<Option<Permission>, DomainError>;

    async fn list_roles(&self) -> Result<Vec<Role>, DomainError>;

    async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError>;

    /// Toggle `is_active` on a role, returning false if the role does not exist
    async fn set_role_active(&self, name: &str, is_active: bool) -> Result<bool, DomainError>;

    /// Toggle `is_active` on a permission, returning false if it does not exist
    async fn set_permission_active(&self, name: &str, is_active: bool)
        -> Result<bool, DomainError>;

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), DomainError>;

    /// Returns false if the user did not hold the role
    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, DomainError>;

    /// Every role assigned to the user, active or not
    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, DomainError>;

    async fn assign_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<(), DomainError>;

    /// Returns false if the role did not have the permission
    async fn remove_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<bool, DomainError>;

    /// Every permission granted to the role, active or not
    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, DomainError>;

    /// The whole role to permission relation, used to rebuild the policy cache
    async fn list_role_grants(&self) -> Result<Vec<RoleGrant>, DomainError>;
}
