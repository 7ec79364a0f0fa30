//! # Surplus Module
//!
//! Compares a period's sales with the stock that was made for it.
//!
//! ```text
//! stock    [15, 25, 25, 45, 55, 65]
//! sales  − [10, 20, 30, 40, 50, 60]
//!          ────────────────────────
//! surplus  [ 5,  5, -5,  5,  5,  5]
//!             │       │
//!             │       └── sold out: 5 extra had to be made
//!             └────────── 5 left over (waste)
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{SalesRecord, StockRecord, SurplusRecord};

/// Computes `stock[i] - sales[i]` for every item type.
///
/// No clamping: negative results are kept.
///
/// ## Errors
/// - [`CoreError::ShapeMismatch`] when the records differ in width
/// - [`CoreError::Overflow`] when a difference does not fit in an i64
pub fn compute(stock: &StockRecord, sales: &SalesRecord) -> CoreResult<SurplusRecord> {
    if stock.len() != sales.len() {
        return Err(CoreError::ShapeMismatch {
            expected: sales.len(),
            actual: stock.len(),
        });
    }

    let values = stock
        .values()
        .iter()
        .zip(sales.values())
        .enumerate()
        .map(|(i, (stocked, sold))| {
            stocked
                .checked_sub(*sold)
                .ok_or(CoreError::Overflow { column: i + 1 })
        })
        .collect::<CoreResult<Vec<i64>>>()?;

    Ok(SurplusRecord::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surplus_reference_scenario() {
        let stock = StockRecord::new(vec![15, 25, 25, 45, 55, 65]);
        let sales = SalesRecord::new(vec![10, 20, 30, 40, 50, 60]);

        let surplus = compute(&stock, &sales).unwrap();
        assert_eq!(surplus.values(), &[5, 5, -5, 5, 5, 5]);
    }

    #[test]
    fn test_surplus_elementwise_with_negatives() {
        let stock = StockRecord::new(vec![0, 10, -3]);
        let sales = SalesRecord::new(vec![4, 10, 2]);

        let surplus = compute(&stock, &sales).unwrap();
        for i in 0..3 {
            assert_eq!(
                surplus.values()[i],
                stock.values()[i] - sales.values()[i]
            );
        }
        assert_eq!(surplus.values(), &[-4, 0, -5]);
    }

    #[test]
    fn test_out_of_range_difference_names_column() {
        let stock = StockRecord::new(vec![0, i64::MAX]);
        let sales = SalesRecord::new(vec![1, -1]);

        let err = compute(&stock, &sales).unwrap_err();
        assert!(matches!(err, CoreError::Overflow { column: 2 }));

        let stock = StockRecord::new(vec![i64::MIN]);
        let sales = SalesRecord::new(vec![1]);
        assert!(matches!(
            compute(&stock, &sales),
            Err(CoreError::Overflow { column: 1 })
        ));

        // Extremes that still fit are fine
        let stock = StockRecord::new(vec![i64::MAX, i64::MIN]);
        let sales = SalesRecord::new(vec![i64::MAX, i64::MIN]);
        assert_eq!(compute(&stock, &sales).unwrap().values(), &[0, 0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let stock = StockRecord::new(vec![1, 2, 3, 4, 5]);
        let sales = SalesRecord::new(vec![1, 2, 3, 4, 5, 6]);

        let err = compute(&stock, &sales).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ShapeMismatch {
                expected: 6,
                actual: 5
            }
        ));
    }
}
