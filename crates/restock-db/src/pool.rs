//! # Database Handle
//!
//! Opens the SQLite file that holds the sales, stock and surplus tables.
//!
//! ## What `Database::open` Does
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig { path, max_connections, connect_timeout }                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ":memory:"? ──yes──► one pinned connection, never idled out           │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  file (created if missing), WAL journal, NORMAL sync                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pool ready ──► embedded migrations ──► db.tables() for the pipeline   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets `restock show` read while a run in another terminal appends.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::table::TableRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the tables live and how the pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("market.db")
///     .max_connections(2)
///     .connect_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,

    /// Pool size. Default: 2
    pub max_connections: u32,

    /// How long to wait for a free connection. Default: 30 seconds
    pub connect_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: path.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// A throwaway database (tests, dry runs).
    pub fn in_memory() -> Self {
        DbConfig::new(IN_MEMORY).max_connections(1)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()));
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // May lose the last append on power loss, never corrupts
            .synchronous(SqliteSynchronous::Normal))
    }
}

// =============================================================================
// Database
// =============================================================================

/// An open, migrated Restock database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and applies pending migrations.
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.path.display(), "Opening restock database");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout);

        if config.is_in_memory() {
            // Each in-memory connection is its own database: keep exactly one alive
            if config.max_connections != 1 {
                warn!(
                    requested = config.max_connections,
                    "In-memory database forced to a single connection"
                );
            }
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool connected");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Returns (total, applied) migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The table store handed to the pipeline.
    pub fn tables(&self) -> TableRepository {
        TableRepository::new(self.pool.clone())
    }

    /// Closes the pool. Later table operations fail as unavailable.
    pub async fn close(&self) {
        debug!("Closing restock database");
        self.pool.close().await;
    }

    /// True if a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_core::Table;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (total, applied) = db.migration_status().await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database_keeps_rows_across_reopen() {
        let path = std::env::temp_dir().join(format!("restock-{}.db", uuid::Uuid::new_v4()));

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        db.tables().append(Table::Stock, &[1, 2, 3]).await.unwrap();
        db.close().await;

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.tables().count(Table::Stock).await.unwrap(), 1);
        db.close().await;

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/market.db")
            .max_connections(4)
            .connect_timeout(Duration::from_secs(3));

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
