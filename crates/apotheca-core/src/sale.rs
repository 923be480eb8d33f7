//! # Cart Pricing
//!
//! Pure pricing and stock checks for a sale. The database layer loads the
//! drugs inside its transaction, calls [`price_cart`], and writes the
//! result.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_cart(lines)        empty? too many lines? bad quantity?      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  price_cart(lines, drugs)                                              │
//! │        ├── drug missing or in recycle bin ──► DrugNotFound             │
//! │        ├── accumulated demand > stock     ──► InsufficientStock        │
//! │        └── line_total = qty × price, total = Σ line_total              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is checked against the summed demand per drug, so two lines for
//! the same drug cannot together overdraw it.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, Drug};
use crate::validation::{validate_cart_size, validate_quantity};

/// One priced line, ready to be written as a sale item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub drug_id: String,
    pub drug_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A fully priced cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    /// In cart order; repeated drugs stay separate lines.
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Checks the shape of a cart before any drug is loaded.
pub fn validate_cart(lines: &[CartLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if validate_cart_size(lines.len()).is_err() {
        return Err(CoreError::CartTooLarge {
            max: crate::MAX_CART_ITEMS,
        });
    }
    for line in lines {
        if line.drug_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "drugId".to_string(),
            }
            .into());
        }
        validate_quantity(line.quantity)?;
    }
    Ok(())
}

fn total_overflow() -> CoreError {
    ValidationError::OutOfRange {
        field: "total".to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

/// Prices `lines` against the current state of `drugs`.
///
/// `drugs` holds whatever was found for the cart's ids; anything absent is
/// treated as not found.
pub fn price_cart(lines: &[CartLine], drugs: &[Drug]) -> CoreResult<PricedCart> {
    validate_cart(lines)?;

    let by_id: HashMap<&str, &Drug> = drugs.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut demand: HashMap<&str, i64> = HashMap::new();
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for line in lines {
        let drug = match by_id.get(line.drug_id.as_str()) {
            Some(drug) if !drug.is_deleted => *drug,
            _ => return Err(CoreError::DrugNotFound(line.drug_id.clone())),
        };

        let requested = demand.entry(drug.id.as_str()).or_insert(0);
        *requested += line.quantity;
        if !drug.can_sell(*requested) {
            return Err(CoreError::InsufficientStock {
                code: drug.code.clone(),
                name: drug.name.clone(),
                available: drug.stock,
                requested: *requested,
            });
        }

        let line_total = drug
            .price()
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(total_overflow)?;
        total = total.checked_add(line_total).ok_or_else(total_overflow)?;

        priced.push(PricedLine {
            drug_id: drug.id.clone(),
            drug_name: drug.name.clone(),
            quantity: line.quantity,
            unit_price: drug.price(),
            line_total,
        });
    }

    Ok(PricedCart {
        lines: priced,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
