//! # Error Types
//!
//! Domain-specific error types for restock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  restock-core errors (this file)                                       │
//! │  ├── ValidationError  - Operator input rejected (re-prompted)          │
//! │  ├── StoreError       - Table store failures (fatal for the run)       │
//! │  ├── ConfigError      - Pipeline settings rejected at startup          │
//! │  └── CoreError        - Structural failures in derived data            │
//! │                                                                         │
//! │  pipeline.rs                                                           │
//! │  └── PipelineError    - CoreError + the stage it happened in           │
//! │                                                                         │
//! │  restock-db errors (separate crate)                                    │
//! │  └── DbError          - Converted into StoreError at the trait seam    │
//! │                                                                         │
//! │  Flow: DbError → StoreError → CoreError → PipelineError → operator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (counts, table, column, value)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::store::Table;

// =============================================================================
// Validation Error
// =============================================================================

/// Operator input rejected by the validator.
///
/// Never fatal: the pipeline reports it and asks again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A token is not a base-10 integer (empty tokens included).
    #[error("'{token}' at position {position} is not a whole number")]
    NonInteger { position: usize, token: String },

    /// Every token parsed, but there are not exactly K of them.
    #[error("Exactly {expected} values required, you provided {actual}")]
    WrongCount { expected: usize, actual: usize },
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`TableStore`](crate::store::TableStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached or the operation failed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Table name not one of sales / stock / surplus.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column index outside `1..=K`.
    #[error("Column {index} is out of range for the {table} table")]
    ColumnOutOfRange { table: Table, index: usize },

    /// A stored row could not be decoded.
    #[error("Corrupt row in the {table} table: {reason}")]
    CorruptRow { table: Table, reason: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Structural errors raised while deriving surplus and forecast rows.
///
/// Any of these ends the run. Stages that already completed stay committed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two records that must line up item-for-item have different widths.
    #[error("Shape mismatch: expected {expected} values, found {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The stock table has no rows to compare sales against.
    #[error("The stock table is empty; record an initial stock row first")]
    MissingStock,

    /// A sales history column has no entries to average.
    #[error("No sales history for item column {column}")]
    EmptyHistory { column: usize },

    /// An item value left the i64 range.
    #[error("Value for item column {column} is out of range")]
    Overflow { column: usize },

    /// A stored cell is not an integer.
    #[error("Malformed cell in the {table} table, column {column}: '{value}'")]
    MalformedCell {
        table: Table,
        column: usize,
        value: String,
    },

    /// Table store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Config Error
// =============================================================================

/// Pipeline configuration rejected before any run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required setting is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A setting has an unusable value.
    #[error("{field} is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
