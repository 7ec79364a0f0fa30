//! # Table Repository
//!
//! Append-only storage for the sales, stock and surplus tables.
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seq  │ id (uuid v4)  │ cells                       │ recorded_at      │
//! │───────┼───────────────┼─────────────────────────────┼──────────────────│
//! │  1    │ 7f3c…         │ ["15","25","25","45","55"…] │ 2024-03-01T09:…  │
//! │  2    │ a91e…         │ ["11","22","33","44","55"…] │ 2024-03-08T09:…  │
//! │                                                                         │
//! │  ORDER BY seq = append order. Highest seq = latest row.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each append is a single INSERT, so it is atomic on its own. Nothing here
//! spans tables; the pipeline decides what happens when a later stage fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use restock_core::{StoreError, Table, TableStore};

/// One stored row with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    /// Append sequence; defines "latest".
    pub seq: i64,
    pub id: String,
    pub cells: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Repository for the three period tables.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Appends one row and returns it with its assigned metadata.
    pub async fn append(&self, table: Table, values: &[i64]) -> DbResult<StoredRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let cells: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let payload =
            serde_json::to_string(&cells).map_err(|e| DbError::Internal(e.to_string()))?;

        debug!(%table, id = %id, cells = %payload, "Appending row");

        // Table names come from a closed enum, never from input
        let sql = format!(
            "INSERT INTO {} (id, cells, recorded_at) VALUES (?1, ?2, ?3)",
            table.as_str()
        );
        let result = sqlx::query(&sql)
            .bind(&id)
            .bind(&payload)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(StoredRow {
            seq: result.last_insert_rowid(),
            id,
            cells,
            recorded_at: now,
        })
    }

    /// Gets every row, oldest first.
    pub async fn all(&self, table: Table) -> DbResult<Vec<StoredRow>> {
        let sql = format!(
            "SELECT seq, id, cells, recorded_at FROM {} ORDER BY seq ASC",
            table.as_str()
        );
        let rows: Vec<(i64, String, String, DateTime<Utc>)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| decode_row(table, row))
            .collect()
    }

    /// Gets the last `n` rows, oldest first.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // restock show stock --last 3
    /// let rows = repo.last_rows(Table::Stock, 3).await?;
    /// ```
    pub async fn last_rows(&self, table: Table, n: u32) -> DbResult<Vec<StoredRow>> {
        let sql = format!(
            "SELECT seq, id, cells, recorded_at FROM \
             (SELECT seq, id, cells, recorded_at FROM {} ORDER BY seq DESC LIMIT ?1) \
             ORDER BY seq ASC",
            table.as_str()
        );
        let rows: Vec<(i64, String, String, DateTime<Utc>)> = sqlx::query_as(&sql)
            .bind(n as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| decode_row(table, row))
            .collect()
    }

    /// Counts the rows in a table.
    pub async fn count(&self, table: Table) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Gets one column (1-based), oldest first.
    ///
    /// Fails with `ColumnOutOfRange` if any row is narrower than `index`.
    pub async fn column(&self, table: Table, index: usize) -> DbResult<Vec<String>> {
        if index == 0 {
            return Err(DbError::ColumnOutOfRange { table, index });
        }

        self.all(table)
            .await?
            .into_iter()
            .map(|mut row| {
                if row.cells.len() < index {
                    return Err(DbError::ColumnOutOfRange { table, index });
                }
                Ok(row.cells.swap_remove(index - 1))
            })
            .collect()
    }
}

fn decode_row(
    table: Table,
    (seq, id, cells, recorded_at): (i64, String, String, DateTime<Utc>),
) -> DbResult<StoredRow> {
    let cells: Vec<String> = serde_json::from_str(&cells).map_err(|e| DbError::CorruptRow {
        table,
        seq,
        reason: e.to_string(),
    })?;

    Ok(StoredRow {
        seq,
        id,
        cells,
        recorded_at,
    })
}

#[async_trait]
impl TableStore for TableRepository {
    async fn append_row(&self, table: Table, values: &[i64]) -> Result<(), StoreError> {
        self.append(table, values).await?;
        Ok(())
    }

    async fn get_all_rows(&self, table: Table) -> Result<Vec<Vec<String>>, StoreError> {
        let rows = self.all(table).await?;
        Ok(rows.into_iter().map(|row| row.cells).collect())
    }

    async fn get_column(&self, table: Table, index: usize) -> Result<Vec<String>, StoreError> {
        Ok(self.column(table, index).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use restock_core::{CoreError, Pipeline, PipelineConfig, PipelineError, Stage};
    use std::collections::VecDeque;
    use std::sync::Arc;

    async fn repo() -> (Database, TableRepository) {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let repo = db.tables();
        (db, repo)
    }

    struct Lines(VecDeque<&'static str>);

    #[async_trait]
    impl restock_core::InputSource for Lines {
        async fn next_line(&mut self, _prompt: &str) -> std::io::Result<Option<String>> {
            Ok(self.0.pop_front().map(String::from))
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back_in_order() {
        let (_db, repo) = repo().await;

        let first = repo.append(Table::Sales, &[1, 2, 3]).await.unwrap();
        let second = repo.append(Table::Sales, &[4, 5, 6]).await.unwrap();
        assert!(second.seq > first.seq);
        assert_ne!(first.id, second.id);

        let rows = repo.all(Table::Sales).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells, vec!["1", "2", "3"]);
        assert_eq!(rows[1], second);

        assert_eq!(repo.count(Table::Sales).await.unwrap(), 2);
        assert_eq!(repo.count(Table::Stock).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_last_rows_keeps_append_order() {
        let (_db, repo) = repo().await;
        for v in 1..=4 {
            repo.append(Table::Stock, &[v]).await.unwrap();
        }

        let rows = repo.last_rows(Table::Stock, 2).await.unwrap();
        let cells: Vec<_> = rows.iter().map(|r| r.cells[0].as_str()).collect();
        assert_eq!(cells, vec!["3", "4"]);

        assert_eq!(repo.last_rows(Table::Stock, 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_column_and_bounds() {
        let (_db, repo) = repo().await;
        repo.append(Table::Sales, &[10, 20]).await.unwrap();
        repo.append(Table::Sales, &[11, 21]).await.unwrap();

        assert_eq!(repo.column(Table::Sales, 2).await.unwrap(), vec!["20", "21"]);
        assert!(repo.column(Table::Surplus, 1).await.unwrap().is_empty());

        let err = repo.get_column(Table::Sales, 3).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::ColumnOutOfRange {
                table: Table::Sales,
                index: 3
            }
        );
        assert!(repo.get_column(Table::Sales, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_cells_are_reported() {
        let (db, repo) = repo().await;
        sqlx::query("INSERT INTO stock (id, cells, recorded_at) VALUES ('x', 'not json', ?1)")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.get_all_rows(Table::Stock).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::CorruptRow {
                table: Table::Stock,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let (db, repo) = repo().await;
        db.close().await;

        let err = repo.append_row(Table::Sales, &[1]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_pipeline_against_sqlite() {
        let (_db, repo) = repo().await;
        repo.append(Table::Stock, &[15, 25, 25, 45, 55, 65]).await.unwrap();

        let pipeline = Pipeline::new(Arc::new(repo.clone()), PipelineConfig::default()).unwrap();
        let mut input = Lines(VecDeque::from(["1,2,a,4,5,6", "10,20,30,40,50,60"]));

        let summary = pipeline.run(&mut input).await.unwrap();

        assert_eq!(summary.surplus.values(), &[5, 5, -5, 5, 5, 5]);
        assert_eq!(summary.forecast.values(), &[11, 22, 33, 44, 55, 66]);

        let stock = repo.all(Table::Stock).await.unwrap();
        assert_eq!(stock.len(), 2);
        assert_eq!(stock[1].cells, vec!["11", "22", "33", "44", "55", "66"]);
        assert_eq!(repo.count(Table::Surplus).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_without_stock_leaves_surplus_empty() {
        let (_db, repo) = repo().await;

        let pipeline = Pipeline::new(Arc::new(repo.clone()), PipelineConfig::default()).unwrap();
        let mut input = Lines(VecDeque::from(["10,20,30,40,50,60"]));

        let err = pipeline.run(&mut input).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Stage {
                stage: Stage::ComputingSurplus,
                source: CoreError::MissingStock
            }
        ));
        assert_eq!(repo.count(Table::Sales).await.unwrap(), 1);
        assert_eq!(repo.count(Table::Surplus).await.unwrap(), 0);
    }
}
