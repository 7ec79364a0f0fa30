//! # Table Store
//!
//! The capability the pipeline needs from persistence, plus an in-memory
//! implementation for tests and dry runs.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales    one row per period, entered by the operator                  │
//! │  surplus  one row per period, stock − sales                            │
//! │  stock    one row per period, the forecast for the NEXT period         │
//! │                                                                         │
//! │  Every row: K cells, one per item type, column 1..=K                   │
//! │  "Latest" row = the last one appended                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cells come back as strings, the way a spreadsheet-like store would hand
//! them out. [`parse_row`] and [`parse_column`] turn them into integers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{CoreError, CoreResult, StoreError};
use crate::validation::parse_integer;

// =============================================================================
// Table
// =============================================================================

/// The three named tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Sales,
    Stock,
    Surplus,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Sales, Table::Stock, Table::Surplus];

    /// Canonical table name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Table::Sales => "sales",
            Table::Stock => "stock",
            Table::Surplus => "surplus",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Ok(Table::Sales),
            "stock" => Ok(Table::Stock),
            "surplus" => Ok(Table::Surplus),
            _ => Err(StoreError::UnknownTable(s.to_string())),
        }
    }
}

// =============================================================================
// Store Capability
// =============================================================================

/// Row-oriented table persistence.
///
/// Implementations must return rows in append order and make each
/// `append_row` atomic on its own. No cross-table transactions are expected.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Appends one row of K integers.
    async fn append_row(&self, table: Table, values: &[i64]) -> Result<(), StoreError>;

    /// Returns every row, oldest first.
    async fn get_all_rows(&self, table: Table) -> Result<Vec<Vec<String>>, StoreError>;

    /// Returns one column (1-based index), oldest first.
    async fn get_column(&self, table: Table, index: usize) -> Result<Vec<String>, StoreError>;
}

// =============================================================================
// Cell Decoding
// =============================================================================

/// Parses a stored row into integers.
pub fn parse_row(table: Table, cells: &[String]) -> CoreResult<Vec<i64>> {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| parse_cell(table, i + 1, cell))
        .collect()
}

/// Parses a stored column (1-based `column`) into integers.
pub fn parse_column(table: Table, column: usize, cells: &[String]) -> CoreResult<Vec<i64>> {
    cells
        .iter()
        .map(|cell| parse_cell(table, column, cell))
        .collect()
}

fn parse_cell(table: Table, column: usize, cell: &str) -> CoreResult<i64> {
    parse_integer(cell).ok_or_else(|| CoreError::MalformedCell {
        table,
        column,
        value: cell.to_string(),
    })
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// A [`TableStore`] backed by process memory.
///
/// ## Usage
/// ```rust
/// use restock_core::{MemoryStore, Table};
///
/// let store = MemoryStore::new().with_rows(Table::Stock, vec![vec![15, 25, 25, 45, 55, 65]]);
/// assert_eq!(store.rows(Table::Stock).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Vec<String>>>>,
    unavailable: AtomicBool,
    failing_appends: Mutex<HashSet<Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a table (builder style).
    pub fn with_rows(self, table: Table, rows: Vec<Vec<i64>>) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            let entry = tables.entry(table).or_default();
            entry.extend(rows.into_iter().map(to_cells));
        }
        self
    }

    /// Pre-populates a table with raw cells, e.g. to simulate bad data.
    pub fn with_raw_rows(self, table: Table, rows: Vec<Vec<String>>) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.entry(table).or_default().extend(rows);
        }
        self
    }

    /// Simulates an outage: every call fails with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes appends to one table fail with `Unavailable` while set.
    /// Reads and other tables are unaffected.
    pub fn set_append_failure(&self, table: Table, failing: bool) {
        if let Ok(mut tables) = self.failing_appends.lock() {
            if failing {
                tables.insert(table);
            } else {
                tables.remove(&table);
            }
        }
    }

    /// Snapshot of a table's rows (for assertions).
    pub fn rows(&self, table: Table) -> Vec<Vec<String>> {
        self.tables
            .lock()
            .map(|tables| tables.get(&table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Table, Vec<Vec<String>>>>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn to_cells(values: Vec<i64>) -> Vec<String> {
    values.into_iter().map(|v| v.to_string()).collect()
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn append_row(&self, table: Table, values: &[i64]) -> Result<(), StoreError> {
        self.check_available()?;
        let rejected = self
            .failing_appends
            .lock()
            .map(|tables| tables.contains(&table))
            .unwrap_or(true);
        if rejected {
            return Err(StoreError::Unavailable(format!(
                "appends to {} are failing",
                table
            )));
        }

        let mut tables = self.lock()?;
        tables
            .entry(table)
            .or_default()
            .push(to_cells(values.to_vec()));
        Ok(())
    }

    async fn get_all_rows(&self, table: Table) -> Result<Vec<Vec<String>>, StoreError> {
        self.check_available()?;
        let tables = self.lock()?;
        Ok(tables.get(&table).cloned().unwrap_or_default())
    }

    async fn get_column(&self, table: Table, index: usize) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        if index == 0 {
            return Err(StoreError::ColumnOutOfRange { table, index });
        }

        let tables = self.lock()?;
        let rows = match tables.get(&table) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        rows.iter()
            .map(|row| {
                row.get(index - 1)
                    .cloned()
                    .ok_or(StoreError::ColumnOutOfRange { table, index })
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), table);
        }
        assert_eq!(" Stock ".parse::<Table>().unwrap(), Table::Stock);
        assert!(matches!(
            "orders".parse::<Table>(),
            Err(StoreError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_parse_row_reports_column() {
        let cells = vec!["1".to_string(), " 2 ".to_string(), "x".to_string()];
        let err = parse_row(Table::Stock, &cells).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedCell { table: Table::Stock, column: 3, .. }
        ));

        assert_eq!(parse_row(Table::Stock, &cells[..2]).unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_memory_store_append_and_read() {
        let store = MemoryStore::new();
        store.append_row(Table::Sales, &[1, 2, 3]).await.unwrap();
        store.append_row(Table::Sales, &[4, 5, 6]).await.unwrap();

        let rows = store.get_all_rows(Table::Sales).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["4", "5", "6"]);

        let column = store.get_column(Table::Sales, 2).await.unwrap();
        assert_eq!(column, vec!["2", "5"]);

        assert!(store.get_all_rows(Table::Surplus).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_column_bounds() {
        let store = MemoryStore::new().with_rows(Table::Sales, vec![vec![1, 2]]);

        assert!(matches!(
            store.get_column(Table::Sales, 0).await,
            Err(StoreError::ColumnOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            store.get_column(Table::Sales, 3).await,
            Err(StoreError::ColumnOutOfRange { index: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_append_failure_is_per_table() {
        let store = MemoryStore::new().with_rows(Table::Stock, vec![vec![1]]);
        store.set_append_failure(Table::Stock, true);

        assert!(matches!(
            store.append_row(Table::Stock, &[2]).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.get_all_rows(Table::Stock).await.unwrap().len(), 1);
        assert!(store.append_row(Table::Sales, &[2]).await.is_ok());

        store.set_append_failure(Table::Stock, false);
        assert!(store.append_row(Table::Stock, &[2]).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_outage() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.append_row(Table::Sales, &[1]).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_unavailable(false);
        assert!(store.append_row(Table::Sales, &[1]).await.is_ok());
    }
}
