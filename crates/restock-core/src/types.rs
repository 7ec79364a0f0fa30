//! # Domain Types
//!
//! Record value types that flow through the pipeline.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Record Types                                    │
//! │                                                                         │
//! │  Every record is K integers, one per item type, in column order.       │
//! │                                                                         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐             │
//! │  │  SalesRecord  │   │  StockRecord  │   │ SurplusRecord │             │
//! │  │  units sold   │   │ units stocked │   │ stock - sales │             │
//! │  │ (operator in) │   │ (latest row)  │   │  (+ waste)    │             │
//! │  └───────────────┘   └───────────────┘   └───────────────┘             │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌────────────────┐                         │
//! │  │ SalesHistoryWindow   │──►│ ForecastRecord │                         │
//! │  │ K columns, ≤ W each  │   │ next stock row │                         │
//! │  └──────────────────────┘   └────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are immutable once built: there are no setters, only
//! constructors and read accessors.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Period Records
// =============================================================================

macro_rules! period_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Vec<i64>);

        impl $name {
            /// Wraps per-item values, in item order.
            pub fn new(values: Vec<i64>) -> Self {
                $name(values)
            }

            /// Per-item values, in item order.
            #[inline]
            pub fn values(&self) -> &[i64] {
                &self.0
            }

            /// Number of item types (K).
            #[inline]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Consumes the record, handing the values to the persistence boundary.
            pub fn into_values(self) -> Vec<i64> {
                self.0
            }
        }

        impl From<Vec<i64>> for $name {
            fn from(values: Vec<i64>) -> Self {
                $name(values)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_values(f, &self.0)
            }
        }
    };
}

period_record! {
    /// Units sold per item type in one period, as entered by the operator.
    ///
    /// Negative values are accepted as-is.
    SalesRecord
}

period_record! {
    /// Units stocked per item type, read from the latest stock row.
    StockRecord
}

period_record! {
    /// Stock minus sales per item type.
    ///
    /// Positive = leftover (waste), negative = demand beyond stock that was
    /// covered by extra production.
    SurplusRecord
}

period_record! {
    /// Recommended stock per item type for the next period.
    ForecastRecord
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[i64]) -> fmt::Result {
    write!(f, "[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", value)?;
    }
    write!(f, "]")
}

// =============================================================================
// Sales History Window
// =============================================================================

/// The trailing window of sales, column-major: one sequence per item type.
///
/// Columns hold at most W values. A column is shorter when the sales table
/// has fewer than W rows; it is never padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesHistoryWindow {
    columns: Vec<Vec<i64>>,
}

impl SalesHistoryWindow {
    /// Builds a window from columns that are already trimmed.
    pub fn from_columns(columns: Vec<Vec<i64>>) -> Self {
        SalesHistoryWindow { columns }
    }

    /// Builds a window keeping only the last `window` values of each column.
    ///
    /// ## Example
    /// ```rust
    /// use restock_core::SalesHistoryWindow;
    ///
    /// let history = SalesHistoryWindow::trailing(vec![vec![1, 2, 3, 4, 5, 6, 7]], 5);
    /// assert_eq!(history.columns()[0], vec![3, 4, 5, 6, 7]);
    /// ```
    pub fn trailing(columns: Vec<Vec<i64>>, window: usize) -> Self {
        let columns = columns
            .into_iter()
            .map(|column| {
                let skip = column.len().saturating_sub(window);
                column.into_iter().skip(skip).collect()
            })
            .collect();
        SalesHistoryWindow { columns }
    }

    pub fn columns(&self) -> &[Vec<i64>] {
        &self.columns
    }

    /// Number of item columns (K).
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_display() {
        let surplus = SurplusRecord::new(vec![5, 5, -5, 5, 5, 5]);
        assert_eq!(surplus.to_string(), "[5, 5, -5, 5, 5, 5]");
        assert_eq!(SalesRecord::new(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_record_serializes_as_plain_array() {
        let forecast = ForecastRecord::new(vec![12, 3]);
        let json = serde_json::to_string(&forecast).unwrap();
        assert_eq!(json, "[12,3]");
    }

    #[test]
    fn test_trailing_keeps_short_columns_whole() {
        let history = SalesHistoryWindow::trailing(vec![vec![1, 2], vec![1, 2, 3, 4, 5, 6]], 5);
        assert_eq!(history.columns()[0], vec![1, 2]);
        assert_eq!(history.columns()[1], vec![2, 3, 4, 5, 6]);
        assert_eq!(history.width(), 2);
    }
}
