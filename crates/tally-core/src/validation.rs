//! # Validation Module
//!
//! Input validation utilities for Tally.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console (clap)                                               │
//! │  ├── Argument types (integers, required flags)                         │
//! │  └── Immediate usage errors                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rules (positive quantity, non-negative price)            │
//! │  └── Parsing untyped CSV text into typed fields                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: tally-store                                                  │
//! │  ├── Header/field-count checks on every row                            │
//! │  └── Id uniqueness on write                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{parse_stock, validate_identifier, validate_quantity};
//!
//! validate_identifier("product_id", "P001").unwrap();
//! validate_quantity(5).unwrap();
//! assert_eq!(parse_stock("3.0").unwrap(), 3);
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an identifier such as a product id or customer id.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only (ids end up in file names)
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_identifier;
///
/// assert!(validate_identifier("customer_id", "C-042").is_ok());
/// assert!(validate_identifier("customer_id", "").is_err());
/// assert!(validate_identifier("customer_id", "../etc").is_err());
/// ```
pub fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product or customer).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a password. Stored as given; only emptiness is rejected.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items); anything above
/// [`MAX_PRICE_CENTS`] is rejected.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Parses a stock column.
///
/// Whole numbers are accepted as-is; decimal text with a zero fraction
/// (`"3.0"`, as spreadsheets like to write it) is accepted too. Anything
/// else, including `"abc"` and `"2.5"`, is an `InvalidFormat`.
pub fn parse_stock(text: &str) -> ValidationResult<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "stock".to_string(),
        });
    }

    if let Ok(stock) = text.parse::<i64>() {
        return Ok(stock);
    }

    match text.split_once('.') {
        Some((whole, fraction))
            if !whole.is_empty() && !fraction.is_empty() && fraction.chars().all(|c| c == '0') =>
        {
            whole
                .parse::<i64>()
                .map_err(|_| ValidationError::invalid("stock", format!("'{}' is not a whole number", text)))
        }
        _ => Err(ValidationError::invalid(
            "stock",
            format!("'{}' is not a whole number", text),
        )),
    }
}

/// Parses a price column and rejects negative values.
pub fn parse_price(text: &str) -> ValidationResult<Money> {
    let price: Money = text.parse().map_err(|e| match e {
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason,
        },
        ValidationError::Required { .. } => ValidationError::Required {
            field: "price".to_string(),
        },
        other => other,
    })?;
    validate_price(price)?;
    Ok(price)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct lines) before adding a new line.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
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
    fn test_validate_identifier() {
        assert!(validate_identifier("product_id", "P001").is_ok());
        assert!(validate_identifier("product_id", "pen-blue_2").is_ok());

        assert!(validate_identifier("product_id", "").is_err());
        assert!(validate_identifier("product_id", "   ").is_err());
        assert!(validate_identifier("product_id", "has space").is_err());
        assert!(validate_identifier("product_id", "a/b").is_err());
        assert!(validate_identifier("product_id", &"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Blue Pen").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_parse_stock() {
        assert_eq!(parse_stock("10").unwrap(), 10);
        assert_eq!(parse_stock(" 7 ").unwrap(), 7);
        assert_eq!(parse_stock("3.0").unwrap(), 3);
        assert_eq!(parse_stock("-2").unwrap(), -2);

        assert!(parse_stock("abc").is_err());
        assert!(parse_stock("").is_err());
        assert!(parse_stock("2.5").is_err());
        assert!(parse_stock("3.").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("10.00").unwrap().cents(), 1000);
        assert_eq!(parse_price("0").unwrap().cents(), 0);

        assert!(matches!(
            parse_price("-1"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_price("ten"),
            Err(ValidationError::InvalidFormat { ref field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_price_cap() {
        assert_eq!(parse_price("1000000.00").unwrap().cents(), MAX_PRICE_CENTS);
        assert!(matches!(
            parse_price("1000000.01"),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(parse_price("10000000000000000.00").is_err());
        assert!(validate_price(Money::from_cents(i64::MAX)).is_err());

        // A full cart at the cap still fits in i64.
        let worst = Money::from_cents(MAX_PRICE_CENTS)
            .checked_multiply_quantity(MAX_ITEM_QUANTITY)
            .and_then(|line| line.checked_multiply_quantity(MAX_CART_ITEMS as i64));
        assert!(worst.is_some());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }
}
