//! MySQL implementation of the RefreshTokenRepository trait.
//!
//! Only SHA-256 digests of refresh secrets reach this table; hashing happens
//! in the token service before any call lands here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use caa_core::domain::entities::refresh_token::RefreshToken;
use caa_core::errors::{DomainError, TokenError};
use caa_core::repositories::RefreshTokenRepository;

use super::rows::{column, db_error, is_unique_violation, uuid_column};

/// MySQL implementation of RefreshTokenRepository
pub struct MySqlRefreshTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &MySqlRow) -> Result<RefreshToken, DomainError> {
        Ok(RefreshToken {
            id: uuid_column(row, "id")?,
            token_hash: column(row, "token_hash")?,
            user_id: uuid_column(row, "user_id")?,
            expires_at: column::<DateTime<Utc>>(row, "expires_at")?,
            created_at: column::<DateTime<Utc>>(row, "created_at")?,
        })
    }

    fn insert_error(e: sqlx::Error) -> DomainError {
        if is_unique_violation(&e) {
            DomainError::internal("refresh token collision")
        } else {
            DomainError::internal(format!("Failed to save refresh token: {}", e))
        }
    }
}

const INSERT_TOKEN: &str = r#"
    INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at, created_at)
    VALUES (?, ?, ?, ?, ?)
"#;

#[async_trait]
impl RefreshTokenRepository for MySqlRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<(), DomainError> {
        sqlx::query(INSERT_TOKEN)
            .bind(token.id.to_string())
            .bind(&token.token_hash)
            .bind(token.user_id.to_string())
            .bind(token.expires_at)
            .bind(token.created_at)
            .execute(&self.pool)
            .await
            .map_err(Self::insert_error)?;
        Ok(())
    }

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let query = r#"
            SELECT id, token_hash, user_id, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = ? AND expires_at > ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(token_hash)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find refresh token"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_any_by_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let query = r#"
            SELECT id, token_hash, user_id, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find refresh token"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshToken>, DomainError> {
        let query = r#"
            SELECT id, token_hash, user_id, expires_at, created_at
            FROM refresh_tokens
            WHERE user_id = ? AND expires_at > ?
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(user_id.to_string())
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("find user refresh tokens"))?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete user refresh tokens"))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete refresh token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete expired refresh tokens"))?;

        Ok(result.rows_affected())
    }

    async fn rotate(
        &self,
        old_token_hash: &str,
        new_token: &RefreshToken,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin refresh token rotation"))?;

        // A concurrent rotation of the same secret deletes nothing here and aborts.
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(old_token_hash)
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete rotated refresh token"))?;

        if deleted.rows_affected() == 0 {
            return Err(TokenError::InvalidToken.into());
        }

        sqlx::query(INSERT_TOKEN)
            .bind(new_token.id.to_string())
            .bind(&new_token.token_hash)
            .bind(new_token.user_id.to_string())
            .bind(new_token.expires_at)
            .bind(new_token.created_at)
            .execute(&mut *tx)
            .await
            .map_err(Self::insert_error)?;

        tx.commit()
            .await
            .map_err(db_error("commit refresh token rotation"))?;
        Ok(())
    }
}
