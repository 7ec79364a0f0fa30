//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (restock-core) ← What the pipeline sees                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PipelineError → operator diagnostic naming the failed stage           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use restock_core::{StoreError, Table};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Column index outside the stored row width.
    #[error("Column {index} is out of range for the {table} table")]
    ColumnOutOfRange { table: Table, index: usize },

    /// The `cells` payload of a row could not be decoded.
    #[error("Corrupt row {seq} in the {table} table: {reason}")]
    CorruptRow {
        table: Table,
        seq: i64,
        reason: String,
    },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// What the pipeline sees.
///
/// Shape problems keep their meaning; everything else means the store
/// could not serve the request.
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ColumnOutOfRange { table, index } => {
                StoreError::ColumnOutOfRange { table, index }
            }
            DbError::CorruptRow { table, seq, reason } => StoreError::CorruptRow {
                table,
                reason: format!("row {}: {}", seq, reason),
            },
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_maps_to_store_error() {
        let err: StoreError = DbError::PoolExhausted.into();
        assert_eq!(
            err,
            StoreError::Unavailable("Connection pool exhausted".to_string())
        );

        let err: StoreError = DbError::ColumnOutOfRange {
            table: Table::Sales,
            index: 9,
        }
        .into();
        assert_eq!(
            err,
            StoreError::ColumnOutOfRange {
                table: Table::Sales,
                index: 9
            }
        );
    }
}
