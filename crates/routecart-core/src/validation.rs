//! # Validation Module
//!
//! Input validation for data crossing into the engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client app forms                                              │
//! │  └── Immediate feedback (empty fields, keypad input)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Catalog snapshot sanity (SKU, prices, stock)                       │
//! │  └── Free-text fields (notes, check numbers)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                       │
//! │  └── Authoritative stock, balance and ledger checks                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_LINES, MAX_NOTES_LEN, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use routecart_core::validation::validate_sku;
///
/// assert!(validate_sku("WATER-500").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an identifier coming from the backend (product, customer).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Normalizes an optional free-text note.
///
/// Blank notes become `None`; notes longer than `MAX_NOTES_LEN` are rejected.
pub fn normalize_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates a check number for check collections.
///
/// ## Rules
/// - Must not be empty
/// - At most 30 characters
pub fn validate_check_number(check_number: &str) -> ValidationResult<String> {
    let check_number = check_number.trim();

    if check_number.is_empty() {
        return Err(ValidationError::Required {
            field: "check number".to_string(),
        });
    }

    if check_number.len() > 30 {
        return Err(ValidationError::TooLong {
            field: "check number".to_string(),
            max: 30,
        });
    }

    Ok(check_number.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price. Zero is allowed (free samples); anything above
/// [`MAX_UNIT_PRICE_CENTS`] is rejected.
///
/// ## Example
/// ```rust
/// use routecart_core::money::Money;
/// use routecart_core::validation::validate_price;
///
/// assert!(validate_price("baseUnitPrice", Money::from_cents(200)).is_ok());
/// assert!(validate_price("baseUnitPrice", Money::zero()).is_ok());
/// assert!(validate_price("baseUnitPrice", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock snapshot figure (base units, never negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stockInBaseUnits".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a second-unit conversion factor.
pub fn validate_conversion_factor(factor: i64) -> ValidationResult<()> {
    if factor < 1 {
        return Err(ValidationError::OutOfRange {
            field: "unitsPerSecondUnit".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding a new line.
///
/// ## Rules
/// - Must not exceed MAX_CART_LINES (100)
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("WATER-500").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes(None).unwrap(), None);
        assert_eq!(normalize_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            normalize_notes(Some(" leave at back door ")).unwrap().as_deref(),
            Some("leave at back door")
        );
        assert!(normalize_notes(Some(&"x".repeat(MAX_NOTES_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_check_number() {
        assert_eq!(validate_check_number(" 000123 ").unwrap(), "000123");
        assert!(validate_check_number("").is_err());
        assert!(validate_check_number(&"9".repeat(31)).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_conversion_factor(1).is_ok());
        assert!(validate_conversion_factor(0).is_err());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }

    #[test]
    fn test_price_upper_bound() {
        let ceiling = Money::from_cents(MAX_UNIT_PRICE_CENTS);
        assert!(validate_price("baseUnitPrice", ceiling).is_ok());

        let err = validate_price("baseUnitPrice", ceiling + Money::from_cents(1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "baseUnitPrice".to_string(),
                min: 0,
                max: MAX_UNIT_PRICE_CENTS,
            }
        );
        assert!(validate_price("baseUnitPrice", Money::from_cents(i64::MAX / 2)).is_err());
    }
}
