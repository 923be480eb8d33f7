//! # Error Types
//!
//! Domain-specific error types for apotheca-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  apotheca-core errors (this file)                                      │
//! │  ├── CoreError        - Lifecycle, permission, stock failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  apotheca-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  api-server errors                                                     │
//! │  └── ApiError         - What the client sees (response envelope)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The API layer maps each variant to one category of the response taxonomy.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Drug cannot be found.
    ///
    /// ## When This Occurs
    /// - Drug ID doesn't exist in database
    /// - Drug is in the recycle bin and the operation needs an active drug
    ///   (e.g. selling it)
    #[error("Drug not found: {0}")]
    DrugNotFound(String),

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: Amoxicillin × 5
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Amoxicillin", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Amoxicillin in stock"
    /// ```
    #[error("Insufficient stock for {name} ({code}): available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Caller lacks the role required for an action.
    #[error("Permission denied: {action} requires the admin role")]
    AdminRequired { action: String },

    /// Drug is locked and the action would remove it.
    #[error("Drug {code} is locked and cannot be {action}")]
    DrugLocked { code: String, action: String },

    /// Action is not valid from the drug's current lifecycle state.
    ///
    /// ## When This Occurs
    /// - Soft-deleting a drug that is already in the recycle bin
    /// - Purging an active drug without the permanent flag
    #[error("Cannot {action} drug {code}: {reason}")]
    InvalidTransition {
        code: String,
        action: String,
        reason: String,
    },

    /// Sale request has no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed line items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate drug code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates a Duplicate error for a field/value pair.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::Duplicate {
            field: field.into(),
            value: value.into(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "D100".to_string(),
            name: "Amoxicillin".to_string(),
            available: 7,
            requested: 8,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Amoxicillin (D100): available 7, requested 8"
        );

        let err = CoreError::DrugLocked {
            code: "D001".to_string(),
            action: "deleted".to_string(),
        };
        assert_eq!(err.to_string(), "Drug D001 is locked and cannot be deleted");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::duplicate("code", "D100");
        assert_eq!(err.to_string(), "code 'D100' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
