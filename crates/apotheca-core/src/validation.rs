//! # Validation Module
//!
//! Input validation utilities for Apotheca POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (api-server)                                 │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Malformed JSON → InvalidArgument                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation (codes, prices, stock, quantities)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── Partial UNIQUE index on active drug codes                         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use apotheca_core::validation::{validate_code, validate_quantity};
//!
//! validate_code("D100").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{Drug, NewDrug};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_NOTE_LEN: usize = 2000;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_USERNAME_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a drug code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use apotheca_core::validation::validate_code;
///
/// assert!(validate_code("D100").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("D 100").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a required free-text field such as a name or category.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_NOTE_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a login name.
///
/// ## Example
/// ```rust
/// use apotheca_core::validation::validate_username;
///
/// assert!(validate_username("pharm").is_ok());
/// assert!(validate_username("a b").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

pub fn validate_display_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive
/// - At most [`MAX_ITEM_QUANTITY`] per line
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

/// Validates a price in cents. Zero is allowed (free samples).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

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

pub fn validate_min_stock_threshold(threshold: i64) -> ValidationResult<()> {
    if threshold < 0 {
        return Err(ValidationError::OutOfRange {
            field: "minStockThreshold".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a create payload.
pub fn validate_new_drug(input: &NewDrug) -> ValidationResult<()> {
    validate_code(&input.code)?;
    validate_required_text("name", &input.name, MAX_NAME_LEN)?;
    validate_required_text("category", &input.category, MAX_NAME_LEN)?;
    validate_required_text("manufacturer", &input.manufacturer, MAX_NAME_LEN)?;
    validate_price_cents(input.price_cents)?;
    validate_stock(input.stock)?;
    if let Some(threshold) = input.min_stock_threshold {
        validate_min_stock_threshold(threshold)?;
    }
    validate_optional_text("description", input.description.as_deref())?;
    validate_optional_text("sideEffects", input.side_effects.as_deref())?;
    Ok(())
}

/// Validates a drug after a patch has been merged into it.
pub fn validate_drug(drug: &Drug) -> ValidationResult<()> {
    validate_code(&drug.code)?;
    validate_required_text("name", &drug.name, MAX_NAME_LEN)?;
    validate_required_text("category", &drug.category, MAX_NAME_LEN)?;
    validate_required_text("manufacturer", &drug.manufacturer, MAX_NAME_LEN)?;
    validate_price_cents(drug.price_cents)?;
    validate_stock(drug.stock)?;
    validate_min_stock_threshold(drug.min_stock_threshold)?;
    validate_optional_text("description", drug.description.as_deref())?;
    validate_optional_text("sideEffects", drug.side_effects.as_deref())?;
    Ok(())
}

/// Validates every record of a bulk create and rejects codes repeated
/// within the batch itself.
pub fn validate_new_drug_batch(inputs: &[NewDrug]) -> ValidationResult<()> {
    if inputs.is_empty() {
        return Err(ValidationError::Required {
            field: "drugs".to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(inputs.len());
    for input in inputs {
        validate_new_drug(input)?;
        let code = input.code.trim();
        if !seen.insert(code) {
            return Err(ValidationError::duplicate("code", code));
        }
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale request.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use apotheca_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
