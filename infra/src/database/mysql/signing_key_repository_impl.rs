//! MySQL implementation of the SigningKeyRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;

use caa_core::domain::entities::signing_key::{
    SigningAlgorithm, SigningKey, KEY_CLEANUP_GRACE_DAYS,
};
use caa_core::errors::{DomainError, KeyError};
use caa_core::repositories::SigningKeyRepository;
use caa_core::services::signing_key::generate_signing_key;

use super::rows::{column, db_error, uuid_column};

const SELECT_COLUMNS: &str = r#"
    SELECT id, key_id, private_key, public_key, algorithm, key_size,
           is_active, created_at, expires_at, rotated_at
    FROM signing_keys
"#;

/// MySQL implementation of SigningKeyRepository
///
/// Activation runs in one transaction that locks every active row, so
/// concurrent rotations from several processes serialize on the database.
pub struct MySqlSigningKeyRepository {
    pool: MySqlPool,
}

impl MySqlSigningKeyRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_key(row: &MySqlRow) -> Result<SigningKey, DomainError> {
        let algorithm: String = column(row, "algorithm")?;
        let key_size: u32 = column(row, "key_size")?;

        Ok(SigningKey {
            id: uuid_column(row, "id")?,
            key_id: column(row, "key_id")?,
            private_key: column(row, "private_key")?,
            public_key: column(row, "public_key")?,
            algorithm: algorithm.parse::<SigningAlgorithm>()?,
            key_size: key_size as usize,
            is_active: column(row, "is_active")?,
            created_at: column::<DateTime<Utc>>(row, "created_at")?,
            expires_at: column::<DateTime<Utc>>(row, "expires_at")?,
            rotated_at: column::<Option<DateTime<Utc>>>(row, "rotated_at")?,
        })
    }

    async fn fetch_by_key_id(&self, key_id: &str) -> Result<Option<SigningKey>, DomainError> {
        let query = format!("{} WHERE key_id = ? LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(key_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find signing key"))?;

        row.as_ref().map(Self::row_to_key).transpose()
    }
}

#[async_trait]
impl SigningKeyRepository for MySqlSigningKeyRepository {
    async fn create_key(
        &self,
        key_size: usize,
        algorithm: SigningAlgorithm,
        expires_at: DateTime<Utc>,
    ) -> Result<SigningKey, DomainError> {
        let key = generate_signing_key(key_size, algorithm, expires_at).await?;

        let query = r#"
            INSERT INTO signing_keys (
                id, key_id, private_key, public_key, algorithm, key_size,
                is_active, created_at, expires_at, rotated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(key.id.to_string())
            .bind(&key.key_id)
            .bind(&key.private_key)
            .bind(&key.public_key)
            .bind(key.algorithm.as_str())
            .bind(key.key_size as u32)
            .bind(key.is_active)
            .bind(key.created_at)
            .bind(key.expires_at)
            .bind(key.rotated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("save signing key"))?;

        tracing::debug!(key_id = %key.key_id, "Signing key stored");
        Ok(key)
    }

    async fn activate_key(&self, key_id: &str) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin key activation"))?;

        let target = sqlx::query("SELECT expires_at FROM signing_keys WHERE key_id = ? FOR UPDATE")
            .bind(key_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("lock signing key"))?;

        let Some(target) = target else {
            return Err(KeyError::KeyNotFound {
                key_id: key_id.to_string(),
            }
            .into());
        };
        let expires_at: DateTime<Utc> = column(&target, "expires_at")?;
        if expires_at <= Utc::now() {
            return Err(KeyError::KeyExpired {
                key_id: key_id.to_string(),
            }
            .into());
        }

        sqlx::query("SELECT id FROM signing_keys WHERE is_active = TRUE FOR UPDATE")
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error("lock active signing keys"))?;

        sqlx::query(
            "UPDATE signing_keys SET is_active = FALSE, rotated_at = ? WHERE is_active = TRUE",
        )
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_error("deactivate signing keys"))?;

        sqlx::query("UPDATE signing_keys SET is_active = TRUE WHERE key_id = ?")
            .bind(key_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("activate signing key"))?;

        tx.commit()
            .await
            .map_err(db_error("commit key activation"))?;
        Ok(())
    }

    async fn get_active_key(&self) -> Result<SigningKey, DomainError> {
        let query = format!(
            "{} WHERE is_active = TRUE AND expires_at > ? ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find active signing key"))?;

        match row {
            Some(row) => Self::row_to_key(&row),
            None => Err(KeyError::NoActiveKey.into()),
        }
    }

    async fn get_key_by_key_id(&self, key_id: &str) -> Result<SigningKey, DomainError> {
        match self.fetch_by_key_id(key_id).await? {
            Some(key) if key.is_valid_for_verification() => Ok(key),
            Some(_) => Err(KeyError::KeyExpired {
                key_id: key_id.to_string(),
            }
            .into()),
            None => Err(KeyError::KeyNotFound {
                key_id: key_id.to_string(),
            }
            .into()),
        }
    }

    async fn get_valid_keys(&self) -> Result<Vec<SigningKey>, DomainError> {
        let query = format!(
            "{} WHERE expires_at > ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list valid signing keys"))?;

        rows.iter().map(Self::row_to_key).collect()
    }

    async fn expire_active_keys(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("UPDATE signing_keys SET expires_at = ? WHERE is_active = TRUE")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_error("expire active signing keys"))?;

        Ok(result.rows_affected())
    }

    async fn cleanup_expired_keys(&self) -> Result<u64, DomainError> {
        let cutoff = Utc::now() - Duration::days(KEY_CLEANUP_GRACE_DAYS);
        let result = sqlx::query("DELETE FROM signing_keys WHERE expires_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete expired signing keys"))?;

        Ok(result.rows_affected())
    }

    async fn count_active_keys(&self) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM signing_keys WHERE is_active = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count active signing keys"))?;

        Ok(count as u64)
    }
}
