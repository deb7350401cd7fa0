//! MySQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use caa_core::domain::entities::user::{User, UserStatus};
use caa_core::errors::{AuthError, DomainError};
use caa_core::repositories::UserRepository;

use super::rows::{column, db_error, is_unique_violation, uuid_column};

const SELECT_COLUMNS: &str = r#"
    SELECT id, username, password_hash, editor_password_hash, status,
           is_active, created_at, updated_at
    FROM users
"#;

/// MySQL implementation of UserRepository
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &MySqlRow) -> Result<User, DomainError> {
        let status: String = column(row, "status")?;

        Ok(User {
            id: uuid_column(row, "id")?,
            username: column(row, "username")?,
            password_hash: column(row, "password_hash")?,
            editor_password_hash: column(row, "editor_password_hash")?,
            status: status.parse::<UserStatus>().map_err(DomainError::internal)?,
            is_active: column(row, "is_active")?,
            created_at: column::<DateTime<Utc>>(row, "created_at")?,
            updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
        })
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let query = format!("{} WHERE id = ? LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find user by id"))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let query = format!("{} WHERE username = ? LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find user by username"))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            INSERT INTO users (
                id, username, password_hash, editor_password_hash, status,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.editor_password_hash)
            .bind(user.status.as_str())
            .bind(user.is_active)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Auth(AuthError::UserAlreadyExists)
                } else {
                    DomainError::internal(format!("Failed to create user: {}", e))
                }
            })?;

        tracing::debug!(user_id = %user.id, "User stored");
        Ok(user)
    }
}
