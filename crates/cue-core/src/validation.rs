//! # Validation Module
//!
//! Save-time and operation-time input validation for Cue POS.
//!
//! Rates, prices, and cash amounts are validated here, at the edge,
//! so the pricing engine itself can stay infallible: by the time money
//! math runs, every input has already been checked.

use crate::error::ValidationError;
use crate::MAX_PREPAID_MINUTES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a catalog display name (resource or product).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Money Validators
// =============================================================================

/// Validates an hourly rate at resource save time.
///
/// A non-positive rate is a configuration error caught here, not at
/// pricing time: [`crate::pricing::time_cost`] assumes validated input.
pub fn validate_rate_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "hourly rate".to_string(),
        });
    }

    Ok(())
}

/// Validates a sale price in cents. Zero is allowed (comped items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional cost basis in cents.
pub fn validate_cost_cents(cents: Option<i64>) -> ValidationResult<()> {
    if let Some(cents) = cents {
        if cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "cost".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates an optional stock count. None = untracked.
pub fn validate_stock(stock: Option<i64>) -> ValidationResult<()> {
    if let Some(count) = stock {
        if count < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "stock".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a cash amount (opening float or counted drawer).
pub fn validate_cash_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "cash amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Session Validators
// =============================================================================

/// Validates a prepaid minute quantity (at start or extension).
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_PREPAID_MINUTES`]
pub fn validate_prepaid_minutes(minutes: i64) -> ValidationResult<()> {
    if minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "prepaid minutes".to_string(),
        });
    }

    if minutes > MAX_PREPAID_MINUTES {
        return Err(ValidationError::OutOfRange {
            field: "prepaid minutes".to_string(),
            min: 1,
            max: MAX_PREPAID_MINUTES,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
