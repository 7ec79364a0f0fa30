//! # restock-db: Table Store for Restock
//!
//! This crate keeps the sales, stock and surplus tables in SQLite and
//! exposes them to the pipeline through the `TableStore` trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Restock Data Flow                                │
//! │                                                                         │
//! │  Pipeline::run (restock-core)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    restock-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │ TableRepository│   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│ (table.rs)     │   │  (embedded)  │   │   │
//! │  │   │ SqlitePool    │    │ impl TableStore│   │ 001_init.sql │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/restock/restock.db                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Opening the database file and its pool
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The table repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use restock_db::{Database, DbConfig};
//!
//! let db = Database::open(DbConfig::new("restock.db")).await?;
//! let pipeline = Pipeline::new(Arc::new(db.tables()), PipelineConfig::default())?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::table::{StoredRow, TableRepository};
