//! # Validation Module
//!
//! Parses the operator's comma-separated sales line into a [`SalesRecord`].
//!
//! ## Validation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "10, 20,30,40,50,60"                                                  │
//! │       │                                                                 │
//! │       ▼  split on ','                                                   │
//! │  ["10", " 20", "30", "40", "50", "60"]                                 │
//! │       │                                                                 │
//! │       ▼  trim + parse each token                                       │
//! │       ├── any token not an integer? → NonInteger { position, token }   │
//! │       │                                                                 │
//! │       ▼  count tokens                                                   │
//! │       ├── count != K? → WrongCount { expected: K, actual }             │
//! │       │                                                                 │
//! │       └── OK → SalesRecord([10, 20, 30, 40, 50, 60])                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation only classifies. Printing and re-prompting belong to the
//! pipeline.

use crate::error::ValidationError;
use crate::types::SalesRecord;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Separator between values on the operator's input line.
pub const FIELD_SEPARATOR: char = ',';

/// Validates one raw input line.
///
/// ## Example
/// ```rust
/// use restock_core::validation::validate_line;
/// use restock_core::ValidationError;
///
/// let sales = validate_line("10,20,30,40,50,60", 6).unwrap();
/// assert_eq!(sales.values(), &[10, 20, 30, 40, 50, 60]);
///
/// assert_eq!(
///     validate_line("1,2,3,4,5", 6),
///     Err(ValidationError::WrongCount { expected: 6, actual: 5 })
/// );
/// ```
pub fn validate_line(line: &str, expected: usize) -> ValidationResult<SalesRecord> {
    let tokens: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    validate(&tokens, expected)
}

/// Validates already-split tokens.
///
/// ## Rules
/// - Each token is trimmed, then parsed as a base-10 `i64` (sign optional)
/// - An empty token is invalid, never skipped
/// - Negative numbers are accepted here
/// - The integer check runs before the count check
/// - Order is preserved exactly
pub fn validate<S: AsRef<str>>(tokens: &[S], expected: usize) -> ValidationResult<SalesRecord> {
    let mut values = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let value = parse_integer(token).ok_or_else(|| ValidationError::NonInteger {
            position: i + 1,
            token: token.trim().to_string(),
        })?;
        values.push(value);
    }

    if values.len() != expected {
        return Err(ValidationError::WrongCount {
            expected,
            actual: values.len(),
        });
    }

    Ok(SalesRecord::new(values))
}

/// Parses a trimmed base-10 integer. Shared with store cell decoding.
pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_line_preserves_order() {
        let sales = validate_line("60,50,40,30,20,10", 6).unwrap();
        assert_eq!(sales.values(), &[60, 50, 40, 30, 20, 10]);

        let sales = validate_line("5,5,5,5,5,5", 6).unwrap();
        assert_eq!(sales.values(), &[5, 5, 5, 5, 5, 5]);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let sales = validate_line(" 10 ,20,  30,40\t,50,60 ", 6).unwrap();
        assert_eq!(sales.values(), &[10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_non_integer_token() {
        let err = validate_line("1,2,a,4,5,6", 6).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonInteger {
                position: 3,
                token: "a".to_string()
            }
        );

        assert!(matches!(
            validate_line("1,2,3.5,4,5,6", 6),
            Err(ValidationError::NonInteger { position: 3, .. })
        ));
    }

    #[test]
    fn test_wrong_count_carries_actual() {
        assert_eq!(
            validate_line("1,2,3,4,5", 6),
            Err(ValidationError::WrongCount {
                expected: 6,
                actual: 5
            })
        );
        assert_eq!(
            validate_line("1,2,3,4,5,6,7", 6),
            Err(ValidationError::WrongCount {
                expected: 6,
                actual: 7
            })
        );
    }

    #[test]
    fn test_empty_input_is_non_integer() {
        assert_eq!(
            validate_line("", 6),
            Err(ValidationError::NonInteger {
                position: 1,
                token: String::new()
            })
        );

        // A trailing comma yields an empty token, not a shorter record
        assert!(matches!(
            validate_line("1,2,3,4,5,6,", 6),
            Err(ValidationError::NonInteger { position: 7, .. })
        ));
    }

    #[test]
    fn test_integer_check_runs_before_count_check() {
        assert!(matches!(
            validate_line("1,a,3", 6),
            Err(ValidationError::NonInteger { position: 2, .. })
        ));
    }

    #[test]
    fn test_negative_and_signed_values_accepted() {
        let sales = validate_line("-1,+2,0,4,-5,6", 6).unwrap();
        assert_eq!(sales.values(), &[-1, 2, 0, 4, -5, 6]);
    }

    #[test]
    fn test_validate_tokens_directly() {
        let tokens = vec!["7".to_string(), " 8 ".to_string()];
        assert_eq!(validate(&tokens, 2).unwrap().values(), &[7, 8]);
    }
}
