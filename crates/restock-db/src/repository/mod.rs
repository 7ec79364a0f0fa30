//! # Repository Module
//!
//! Database repository implementations for Restock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pipeline (restock-core)                                               │
//! │       │                                                                 │
//! │       │  store.append_row(Table::Sales, &[10, 20, ...])                │
//! │       ▼                                                                 │
//! │  TableRepository (impl TableStore)                                     │
//! │  ├── append(&self, table, values)                                      │
//! │  ├── all(&self, table)                                                 │
//! │  ├── last_rows(&self, table, n)                                        │
//! │  ├── column(&self, table, index)                                       │
//! │  └── count(&self, table)                                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database (sales / stock / surplus)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`TableRepository`](table::TableRepository) - Append-only period tables

pub mod table;
