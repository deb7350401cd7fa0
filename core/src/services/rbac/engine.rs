//! Authorization engine over the RBAC repository

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::rbac::{normalize, Permission, Role};
use crate::errors::DomainError;
use crate::repositories::RbacRepository;

use super::policy::PolicyCache;
use super::seed::{DEFAULT_PERMISSIONS, DEFAULT_ROLES};

/// Answers permission checks and manages roles, permissions and grants
///
/// Only active roles and active permissions ever grant access. Unknown
/// roles or permissions in a check are a denial, never an error.
pub struct AuthorizationEngine<R: RbacRepository> {
    repository: Arc<R>,
    policies: RwLock<PolicyCache>,
}

impl<R: RbacRepository> AuthorizationEngine<R> {
    /// Create the engine and load the policy cache
    pub async fn new(repository: Arc<R>) -> Result<Self, DomainError> {
        let engine = Self {
            repository,
            policies: RwLock::new(PolicyCache::default()),
        };
        engine.sync_policies().await?;
        Ok(engine)
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Rebuild the policy cache from persistence and swap it in
    ///
    /// The write lock is held across the read so concurrent rebuilds cannot
    /// install an older snapshot over a newer one.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of active (role, grant) pairs loaded
    pub async fn sync_policies(&self) -> Result<usize, DomainError> {
        let mut policies = self.policies.write().await;
        let rows = self.repository.list_role_grants().await?;
        let cache = PolicyCache::from_grants(&rows);
        let loaded = cache.len();

        *policies = cache;
        debug!(grants = loaded, "Policy cache rebuilt");
        Ok(loaded)
    }

    /// Whether any of the user's active roles grants `action` on `resource`
    pub async fn check_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<bool, DomainError> {
        let roles = self.active_user_roles(user_id).await?;
        let resource = normalize(resource);
        let action = normalize(action);

        let policies = self.policies.read().await;
        let allowed = roles
            .iter()
            .any(|role| policies.allows(&role.name, &resource, &action));

        debug!(
            user_id = %user_id,
            resource = %resource,
            action = %action,
            allowed,
            "Permission checked"
        );
        Ok(allowed)
    }

    /// Whether the user holds the named role and it is active
    pub async fn has_role(&self, user_id: Uuid, role_name: &str) -> Result<bool, DomainError> {
        let role_name = normalize(role_name);
        Ok(self
            .active_user_roles(user_id)
            .await?
            .iter()
            .any(|role| role.name == role_name))
    }

    /// Assign a role to a user; assigning twice is a no-op
    ///
    /// # Returns
    /// * `Err(DomainError::NotFound)` - No role with that name
    pub async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), DomainError> {
        let role = self.require_role(role_name).await?;
        self.repository.assign_role(user_id, role.id).await?;
        info!(user_id = %user_id, role = %role.name, "Role assigned");
        Ok(())
    }

    /// Remove a role from a user, returning false if it was not held
    pub async fn remove_role(&self, user_id: Uuid, role_name: &str) -> Result<bool, DomainError> {
        let role = self.require_role(role_name).await?;
        let removed = self.repository.remove_role(user_id, role.id).await?;
        if removed {
            info!(user_id = %user_id, role = %role.name, "Role removed");
        }
        Ok(removed)
    }

    /// Grant a permission to a role
    ///
    /// # Returns
    /// * `Err(DomainError::NotFound)` - Unknown role or permission
    pub async fn assign_permission_to_role(
        &self,
        role_name: &str,
        permission_name: &str,
    ) -> Result<(), DomainError> {
        let role = self.require_role(role_name).await?;
        let permission = self.require_permission(permission_name).await?;

        self.repository
            .assign_permission(role.id, permission.id)
            .await?;
        info!(role = %role.name, permission = %permission.name, "Permission granted");

        self.sync_policies().await?;
        Ok(())
    }

    /// Revoke a permission from a role, returning false if it was not granted
    pub async fn remove_permission_from_role(
        &self,
        role_name: &str,
        permission_name: &str,
    ) -> Result<bool, DomainError> {
        let role = self.require_role(role_name).await?;
        let permission = self.require_permission(permission_name).await?;

        let removed = self
            .repository
            .remove_permission(role.id, permission.id)
            .await?;
        if removed {
            info!(role = %role.name, permission = %permission.name, "Permission revoked");
        }

        self.sync_policies().await?;
        Ok(removed)
    }

    /// Active roles held by the user
    pub async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, DomainError> {
        self.active_user_roles(user_id).await
    }

    /// Active permissions granted through the user's active roles, de-duplicated
    pub async fn get_user_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Permission>, DomainError> {
        let mut seen = HashSet::new();
        let mut permissions = Vec::new();

        for role in self.active_user_roles(user_id).await? {
            for permission in self.repository.get_role_permissions(role.id).await? {
                if permission.is_active && seen.insert(permission.id) {
                    permissions.push(permission);
                }
            }
        }

        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    /// Create a role
    ///
    /// # Returns
    /// * `Err(DomainError::Validation)` - Empty name
    /// * `Err(DomainError::BusinessRule)` - Name already taken
    pub async fn create_role(
        &self,
        name: &str,
        display_name: &str,
        description: &str,
    ) -> Result<Role, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("role name must not be empty"));
        }
        let role = self
            .repository
            .create_role(Role::new(name, display_name, description))
            .await?;
        info!(role = %role.name, "Role created");
        Ok(role)
    }

    /// Create a permission; name, resource and action are trimmed and lower-cased
    pub async fn create_permission(
        &self,
        name: &str,
        display_name: &str,
        description: &str,
        resource: &str,
        action: &str,
    ) -> Result<Permission, DomainError> {
        if name.trim().is_empty() || resource.trim().is_empty() || action.trim().is_empty() {
            return Err(DomainError::validation(
                "permission name, resource and action must not be empty",
            ));
        }
        let permission = self
            .repository
            .create_permission(Permission::new(
                name,
                display_name,
                description,
                resource,
                action,
            ))
            .await?;
        info!(permission = %permission.name, "Permission created");
        Ok(permission)
    }

    /// All active roles, ordered by name
    pub async fn get_all_roles(&self) -> Result<Vec<Role>, DomainError> {
        let mut roles: Vec<Role> = self
            .repository
            .list_roles()
            .await?
            .into_iter()
            .filter(|role| role.is_active)
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    /// All active permissions, ordered by name
    pub async fn get_all_permissions(&self) -> Result<Vec<Permission>, DomainError> {
        let mut permissions: Vec<Permission> = self
            .repository
            .list_permissions()
            .await?
            .into_iter()
            .filter(|permission| permission.is_active)
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    /// Activate or deactivate a role, returning false if it does not exist
    pub async fn set_role_active(&self, name: &str, is_active: bool) -> Result<bool, DomainError> {
        let name = normalize(name);
        let updated = self.repository.set_role_active(&name, is_active).await?;
        if updated {
            info!(role = %name, is_active, "Role activation changed");
            self.sync_policies().await?;
        }
        Ok(updated)
    }

    /// Activate or deactivate a permission, returning false if it does not exist
    pub async fn set_permission_active(
        &self,
        name: &str,
        is_active: bool,
    ) -> Result<bool, DomainError> {
        let name = normalize(name);
        let updated = self
            .repository
            .set_permission_active(&name, is_active)
            .await?;
        if updated {
            info!(permission = %name, is_active, "Permission activation changed");
            self.sync_policies().await?;
        }
        Ok(updated)
    }

    /// Create the built-in roles, permissions and grants that are missing
    ///
    /// Existing roles and permissions keep their activation state, so a
    /// deactivated built-in stays deactivated across restarts.
    pub async fn seed_defaults(&self) -> Result<(), DomainError> {
        for (name, display_name, description) in DEFAULT_ROLES {
            if self.repository.find_role_by_name(name).await?.is_none() {
                self.create_role(name, display_name, description).await?;
            }
        }

        for default in DEFAULT_PERMISSIONS {
            let name = Permission::qualified_name(default.resource, default.action);
            let permission = match self.repository.find_permission_by_name(&name).await? {
                Some(existing) => existing,
                None => {
                    self.create_permission(
                        &name,
                        default.display_name,
                        "",
                        default.resource,
                        default.action,
                    )
                    .await?
                }
            };

            for role_name in default.roles {
                let role = self.require_role(role_name).await?;
                self.repository
                    .assign_permission(role.id, permission.id)
                    .await?;
            }
        }

        let loaded = self.sync_policies().await?;
        info!(grants = loaded, "Default roles and permissions seeded");
        Ok(())
    }

    async fn active_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, DomainError> {
        Ok(self
            .repository
            .get_user_roles(user_id)
            .await?
            .into_iter()
            .filter(|role| role.is_active)
            .collect())
    }

    async fn require_role(&self, name: &str) -> Result<Role, DomainError> {
        let name = normalize(name);
        self.repository
            .find_role_by_name(&name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("role {}", name)))
    }

    async fn require_permission(&self, name: &str) -> Result<Permission, DomainError> {
        let name = normalize(name);
        self.repository
            .find_permission_by_name(&name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("permission {}", name)))
    }
}
