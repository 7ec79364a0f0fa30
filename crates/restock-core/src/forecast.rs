//! # Forecast Module
//!
//! Recommends next period's stock from the trailing sales window.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each item column of the window:                                    │
//! │                                                                         │
//! │     stock = round( mean(column) × (1 + uplift) )                        │
//! │                                                                         │
//! │  Default uplift: 1000 bps = 10%  →  round(mean × 1.1)                   │
//! │                                                                         │
//! │  Example: [10, 12, 11, 9, 13]                                           │
//! │     mean = 55 / 5 = 11                                                  │
//! │     11 × 1.1 = 12.1  →  12                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Round half away from zero: 16.5 → 17, -16.5 → -17, 12.1 → 12.
//!
//! The quotient is evaluated exactly in integers,
//! `sum × (10000 + bps) / (count × 10000)`, so a true tie is always a tie.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{ForecastRecord, SalesHistoryWindow};
use crate::DEFAULT_UPLIFT_BPS;

/// Basis points per whole (10000 bps = 100%).
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Uplift
// =============================================================================

/// Extra stock on top of average sales, in basis points.
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uplift(u32);

impl Uplift {
    /// Highest accepted uplift (100%, i.e. double the average).
    pub const MAX_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Uplift(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the uplift as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for Uplift {
    fn default() -> Self {
        Uplift(DEFAULT_UPLIFT_BPS)
    }
}

// =============================================================================
// Forecast
// =============================================================================

/// Computes the recommended stock level for every item column.
///
/// ## Errors
/// [`CoreError::EmptyHistory`] naming the first (1-based) empty column.
///
/// ## Example
/// ```rust
/// use restock_core::forecast::forecast;
/// use restock_core::{SalesHistoryWindow, Uplift};
///
/// let history = SalesHistoryWindow::from_columns(vec![vec![10, 12, 11, 9, 13]]);
/// let stock = forecast(&history, Uplift::default()).unwrap();
/// assert_eq!(stock.values(), &[12]);
/// ```
pub fn forecast(history: &SalesHistoryWindow, uplift: Uplift) -> CoreResult<ForecastRecord> {
    let mut values = Vec::with_capacity(history.width());

    for (i, column) in history.columns().iter().enumerate() {
        if column.is_empty() {
            return Err(CoreError::EmptyHistory { column: i + 1 });
        }
        values.push(uplifted_mean(column, uplift));
    }

    Ok(ForecastRecord::new(values))
}

/// `round(mean(column) × (1 + uplift))` for a non-empty column.
fn uplifted_mean(column: &[i64], uplift: Uplift) -> i64 {
    let sum: i128 = column.iter().map(|&v| v as i128).sum();
    let numerator = sum * (BPS_SCALE + uplift.bps() as i128);
    let denominator = column.len() as i128 * BPS_SCALE;

    let rounded = div_round_half_away(numerator, denominator);
    i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
}

/// Integer division rounding to nearest, ties away from zero. `den > 0`.
fn div_round_half_away(num: i128, den: i128) -> i128 {
    let magnitude = (2 * num.abs() + den) / (2 * den);
    if num < 0 {
        -magnitude
    } else {
        magnitude
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn single(column: Vec<i64>) -> i64 {
        let history = SalesHistoryWindow::from_columns(vec![column]);
        forecast(&history, Uplift::default()).unwrap().values()[0]
    }

    #[test]
    fn test_reference_window() {
        // mean 11 → 12.1 → 12
        assert_eq!(single(vec![10, 12, 11, 9, 13]), 12);
    }

    #[test]
    fn test_rounds_to_nearest() {
        // mean 2.5 → 2.75 → 3
        assert_eq!(single(vec![2, 3]), 3);
        // mean 10 → 11.0
        assert_eq!(single(vec![10]), 11);
        // mean 4 → 4.4 → 4
        assert_eq!(single(vec![4, 4, 4]), 4);
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        // 15 × 1.1 = 16.5 → 17 (half-to-even would give 16)
        assert_eq!(single(vec![15]), 17);
        // 5 × 1.1 = 5.5 → 6
        assert_eq!(single(vec![5]), 6);
        // -15 × 1.1 = -16.5 → -17
        assert_eq!(single(vec![-15]), -17);
    }

    #[test]
    fn test_every_column_is_forecast() {
        let history = SalesHistoryWindow::from_columns(vec![
            vec![10, 12, 11, 9, 13],
            vec![20],
            vec![0, 0, 0],
        ]);
        let stock = forecast(&history, Uplift::default()).unwrap();
        assert_eq!(stock.values(), &[12, 22, 0]);
    }

    #[test]
    fn test_empty_column_is_an_error() {
        let history = SalesHistoryWindow::from_columns(vec![vec![1, 2], vec![]]);
        let err = forecast(&history, Uplift::default()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyHistory { column: 2 }));
    }

    #[test]
    fn test_custom_uplift() {
        let history = SalesHistoryWindow::from_columns(vec![vec![10, 30]]);
        assert_eq!(
            forecast(&history, Uplift::from_bps(0)).unwrap().values(),
            &[20]
        );
        assert_eq!(
            forecast(&history, Uplift::from_bps(2500)).unwrap().values(),
            &[25]
        );
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let big = i64::MAX / 2;
        // 4611686018427387903 × 1.1 = 5072854620270126693.3
        assert_eq!(single(vec![big, big]), 5_072_854_620_270_126_693);
        assert_eq!(single(vec![i64::MAX]), i64::MAX);
    }
}
