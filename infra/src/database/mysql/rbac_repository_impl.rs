//! MySQL implementation of the RbacRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use caa_core::domain::entities::rbac::{Permission, Role};
use caa_core::errors::DomainError;
use caa_core::repositories::{RbacRepository, RoleGrant};

use super::rows::{column, db_error, is_unique_violation, uuid_column};

const ROLE_COLUMNS: &str =
    "r.id AS role_id, r.name AS role_name, r.display_name AS role_display_name, \
     r.description AS role_description, r.is_active AS role_is_active, \
     r.created_at AS role_created_at, r.updated_at AS role_updated_at";

const PERMISSION_COLUMNS: &str =
    "p.id AS permission_id, p.name AS permission_name, \
     p.display_name AS permission_display_name, p.description AS permission_description, \
     p.resource AS permission_resource, p.action AS permission_action, \
     p.is_active AS permission_is_active, p.created_at AS permission_created_at, \
     p.updated_at AS permission_updated_at";

/// MySQL implementation of RbacRepository
///
/// Join rows are inserted with `INSERT IGNORE` against composite primary
/// keys, which makes assignment idempotent.
pub struct MySqlRbacRepository {
    pool: MySqlPool,
}

impl MySqlRbacRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_role(row: &MySqlRow) -> Result<Role, DomainError> {
        Ok(Role {
            id: uuid_column(row, "role_id")?,
            name: column(row, "role_name")?,
            display_name: column(row, "role_display_name")?,
            description: column(row, "role_description")?,
            is_active: column(row, "role_is_active")?,
            created_at: column::<DateTime<Utc>>(row, "role_created_at")?,
            updated_at: column::<DateTime<Utc>>(row, "role_updated_at")?,
        })
    }

    fn row_to_permission(row: &MySqlRow) -> Result<Permission, DomainError> {
        Ok(Permission {
            id: uuid_column(row, "permission_id")?,
            name: column(row, "permission_name")?,
            display_name: column(row, "permission_display_name")?,
            description: column(row, "permission_description")?,
            resource: column(row, "permission_resource")?,
            action: column(row, "permission_action")?,
            is_active: column(row, "permission_is_active")?,
            created_at: column::<DateTime<Utc>>(row, "permission_created_at")?,
            updated_at: column::<DateTime<Utc>>(row, "permission_updated_at")?,
        })
    }

    async fn role_exists(&self, role_id: Uuid) -> Result<bool, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ?")
            .bind(role_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check role"))?;
        Ok(count > 0)
    }

    async fn permission_exists(&self, permission_id: Uuid) -> Result<bool, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE id = ?")
            .bind(permission_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check permission"))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl RbacRepository for MySqlRbacRepository {
    async fn create_role(&self, role: Role) -> Result<Role, DomainError> {
        let query = r#"
            INSERT INTO roles (id, name, display_name, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(role.id.to_string())
            .bind(&role.name)
            .bind(&role.display_name)
            .bind(&role.description)
            .bind(role.is_active)
            .bind(role.created_at)
            .bind(role.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::BusinessRule {
                        message: format!("role {} already exists", role.name),
                    }
                } else {
                    DomainError::internal(format!("Failed to create role: {}", e))
                }
            })?;

        Ok(role)
    }

    async fn create_permission(&self, permission: Permission) -> Result<Permission, DomainError> {
        let query = r#"
            INSERT INTO permissions (
                id, name, display_name, description, resource, action,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(permission.id.to_string())
            .bind(&permission.name)
            .bind(&permission.display_name)
            .bind(&permission.description)
            .bind(&permission.resource)
            .bind(&permission.action)
            .bind(permission.is_active)
            .bind(permission.created_at)
            .bind(permission.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::BusinessRule {
                        message: format!("permission {} already exists", permission.name),
                    }
                } else {
                    DomainError::internal(format!("Failed to create permission: {}", e))
                }
            })?;

        Ok(permission)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DomainError> {
        let query = format!("SELECT {} FROM roles r WHERE r.name = ? LIMIT 1", ROLE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find role"))?;

        row.as_ref().map(Self::row_to_role).transpose()
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Permission>, DomainError> {
        let query = format!(
            "SELECT {} FROM permissions p WHERE p.name = ? LIMIT 1",
            PERMISSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find permission"))?;

        row.as_ref().map(Self::row_to_permission).transpose()
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DomainError> {
        let query = format!("SELECT {} FROM roles r ORDER BY r.name", ROLE_COLUMNS);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list roles"))?;

        rows.iter().map(Self::row_to_role).collect()
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, DomainError> {
        let query = format!(
            "SELECT {} FROM permissions p ORDER BY p.resource, p.action",
            PERMISSION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list permissions"))?;

        rows.iter().map(Self::row_to_permission).collect()
    }

    async fn set_role_active(&self, name: &str, is_active: bool) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE roles SET is_active = ?, updated_at = ? WHERE name = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_error("update role"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_permission_active(
        &self,
        name: &str,
        is_active: bool,
    ) -> Result<bool, DomainError> {
        let result =
            sqlx::query("UPDATE permissions SET is_active = ?, updated_at = ? WHERE name = ?")
                .bind(is_active)
                .bind(Utc::now())
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(db_error("update permission"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), DomainError> {
        if !self.role_exists(role_id).await? {
            return Err(DomainError::not_found(format!("role {}", role_id)));
        }

        sqlx::query("INSERT IGNORE INTO user_roles (user_id, role_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind(role_id.to_string())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_error("assign role"))?;
        Ok(())
    }

    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id.to_string())
            .bind(role_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("remove role"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, DomainError> {
        let query = format!(
            "SELECT {} FROM roles r \
             INNER JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = ? ORDER BY r.name",
            ROLE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load user roles"))?;

        rows.iter().map(Self::row_to_role).collect()
    }

    async fn assign_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), DomainError> {
        if !self.role_exists(role_id).await? {
            return Err(DomainError::not_found(format!("role {}", role_id)));
        }
        if !self.permission_exists(permission_id).await? {
            return Err(DomainError::not_found(format!("permission {}", permission_id)));
        }

        sqlx::query(
            "INSERT IGNORE INTO role_permissions (role_id, permission_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(role_id.to_string())
        .bind(permission_id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error("assign permission"))?;
        Ok(())
    }

    async fn remove_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, DomainError> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_id = ?")
                .bind(role_id.to_string())
                .bind(permission_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(db_error("remove permission"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, DomainError> {
        let query = format!(
            "SELECT {} FROM permissions p \
             INNER JOIN role_permissions rp ON rp.permission_id = p.id \
             WHERE rp.role_id = ? ORDER BY p.name",
            PERMISSION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(role_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load role permissions"))?;

        rows.iter().map(Self::row_to_permission).collect()
    }

    async fn list_role_grants(&self) -> Result<Vec<RoleGrant>, DomainError> {
        let query = format!(
            "SELECT {}, {} FROM role_permissions rp \
             INNER JOIN roles r ON r.id = rp.role_id \
             INNER JOIN permissions p ON p.id = rp.permission_id",
            ROLE_COLUMNS, PERMISSION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load role grants"))?;

        rows.iter()
            .map(|row| {
                Ok(RoleGrant {
                    role: Self::row_to_role(row)?,
                    permission: Self::row_to_permission(row)?,
                })
            })
            .collect()
    }
}
