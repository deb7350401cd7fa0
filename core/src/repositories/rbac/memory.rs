//! In-process implementation of RbacRepository

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use chrono::Utc;

use crate::domain::entities::rbac::{Permission, Role};
use crate::errors::DomainError;

use super::r#trait::{RbacRepository, RoleGrant};

#[derive(Default)]
struct RbacTables {
    roles: HashMap<Uuid, Role>,
    permissions: HashMap<Uuid, Permission>,
    user_roles: HashSet<(Uuid, Uuid)>,
    role_permissions: HashSet<(Uuid, Uuid)>,
}

/// In-memory RBAC repository
#[derive(Clone, Default)]
pub struct InMemoryRbacRepository {
    tables: Arc<RwLock<RbacTables>>,
}

impl InMemoryRbacRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RbacRepository for InMemoryRbacRepository {
    async fn create_role(&self, role: Role) -> Result<Role, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.roles.values().any(|existing| existing.name == role.name) {
            return Err(DomainError::BusinessRule {
                message: format!("role {} already exists", role.name),
            });
        }
        tables.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn create_permission(&self, permission: Permission) -> Result<Permission, DomainError> {
        let mut tables = self.tables.write().await;
        let taken = tables.permissions.values().any(|existing| {
            existing.name == permission.name
                || (existing.resource == permission.resource
                    && existing.action == permission.action)
        });
        if taken {
            return Err(DomainError::BusinessRule {
                message: format!("permission {} already exists", permission.name),
            });
        }
        tables.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.values().find(|role| role.name == name).cloned())
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Permission>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .permissions
            .values()
            .find(|permission| permission.name == name)
            .cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DomainError> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError> {
        let tables = self.tables.read().await;
        let mut permissions: Vec<Permission> = tables.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| (&a.resource, &a.action).cmp(&(&b.resource, &b.action)));
        Ok(permissions)
    }

    async fn set_role_active(&self, name: &str, is_active: bool) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        match tables.roles.values_mut().find(|role| role.name == name) {
            Some(role) => {
                role.is_active = is_active;
                role.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_permission_active(
        &self,
        name: &str,
        is_active: bool,
    ) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        match tables
            .permissions
            .values_mut()
            .find(|permission| permission.name == name)
        {
            Some(permission) => {
                permission.is_active = is_active;
                permission.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&role_id) {
            return Err(DomainError::not_found(format!("role {}", role_id)));
        }
        tables.user_roles.insert((user_id, role_id));
        Ok(())
    }

    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables.user_roles.remove(&(user_id, role_id)))
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, DomainError> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables
            .user_roles
            .iter()
            .filter(|(holder, _)| *holder == user_id)
            .filter_map(|(_, role_id)| tables.roles.get(role_id).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn assign_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&role_id) {
            return Err(DomainError::not_found(format!("role {}", role_id)));
        }
        if !tables.permissions.contains_key(&permission_id) {
            return Err(DomainError::not_found(format!("permission {}", permission_id)));
        }
        tables.role_permissions.insert((role_id, permission_id));
        Ok(())
    }

    async fn remove_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables.role_permissions.remove(&(role_id, permission_id)))
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .role_permissions
            .iter()
            .filter(|(role, _)| *role == role_id)
            .filter_map(|(_, permission_id)| tables.permissions.get(permission_id).cloned())
            .collect())
    }

    async fn list_role_grants(&self) -> Result<Vec<RoleGrant>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .role_permissions
            .iter()
            .filter_map(|(role_id, permission_id)| {
                let role = tables.roles.get(role_id)?;
                let permission = tables.permissions.get(permission_id)?;
                Some(RoleGrant {
                    role: role.clone(),
                    permission: permission.clone(),
                })
            })
            .collect())
    }
}
