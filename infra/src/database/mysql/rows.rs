//! Row decoding helpers shared by the MySQL repositories

use sqlx::mysql::MySqlRow;
use sqlx::{Decode, MySql, Row, Type};
use uuid::Uuid;

use caa_core::errors::DomainError;

/// Read a column, mapping decode failures to `DomainError::Internal`
pub(crate) fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get(name)
        .map_err(|e| DomainError::internal(format!("Failed to get {}: {}", name, e)))
}

/// Read a `CHAR(36)` column as a UUID
pub(crate) fn uuid_column(row: &MySqlRow, name: &str) -> Result<Uuid, DomainError> {
    let value: String = column(row, name)?;
    Uuid::parse_str(&value)
        .map_err(|e| DomainError::internal(format!("Invalid UUID in {}: {}", name, e)))
}

/// Wrap a SQLx error with the failed operation
pub(crate) fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::internal(format!("Failed to {}: {}", operation, e))
}

/// True if the error is a unique constraint violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}
