//! # restock-core: Pure Pipeline Logic for Restock
//!
//! This crate is the **heart** of Restock. It turns one line of operator
//! input into three stored rows: the period's sales, the surplus against the
//! latest stock snapshot, and a recommended stock level for the next period.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Restock Data Flow                               │
//! │                                                                         │
//! │  "10,20,30,40,50,60"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ restock-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐   ┌───────────┐   ┌───────────┐               │   │
//! │  │   │ validation │──►│  surplus  │   │ forecast  │               │   │
//! │  │   │ SalesRecord│   │ stock-sale│   │ mean×1.1  │               │   │
//! │  │   └────────────┘   └───────────┘   └───────────┘               │   │
//! │  │          ▲               ▲               ▲                      │   │
//! │  │          └───────── pipeline ────────────┘                      │   │
//! │  │                         │                                       │   │
//! │  │                   TableStore trait                              │   │
//! │  └─────────────────────────┬───────────────────────────────────────┘   │
//! │                            ▼                                            │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        restock-db (SQLite: sales / stock / surplus)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Record value types (sales, stock, surplus, forecast)
//! - [`validation`] - Operator input parsing
//! - [`surplus`] - Stock minus sales
//! - [`forecast`] - Restock levels from the trailing sales window
//! - [`store`] - Table store capability and an in-memory implementation
//! - [`pipeline`] - The end-to-end run
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use restock_core::surplus::compute;
//! use restock_core::{SalesRecord, StockRecord};
//!
//! let stock = StockRecord::new(vec![15, 25, 25, 45, 55, 65]);
//! let sales = SalesRecord::new(vec![10, 20, 30, 40, 50, 60]);
//!
//! let surplus = compute(&stock, &sales).unwrap();
//! assert_eq!(surplus.values(), &[5, 5, -5, 5, 5, 5]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod forecast;
pub mod pipeline;
pub mod store;
pub mod surplus;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ConfigError, CoreError, CoreResult, StoreError, ValidationError};
pub use forecast::Uplift;
pub use pipeline::{
    InputSource, NoOpEvents, Pipeline, PipelineConfig, PipelineError, PipelineEvents, RunSummary,
    Stage,
};
pub use store::{MemoryStore, Table, TableStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Item types tracked when no configuration says otherwise.
pub const DEFAULT_ITEMS: [&str; 6] = ["bacon", "chicken", "egg", "ham", "tuna", "turkey"];

/// Number of trailing sales periods averaged by the forecast.
pub const DEFAULT_WINDOW: usize = 5;

/// Extra stock added on top of the average, in basis points (10%).
pub const DEFAULT_UPLIFT_BPS: u32 = 1000;
