//! # Field Diff
//!
//! Computes the field-level change set written to the modification log
//! whenever a drug is edited.
//!
//! ```text
//! stored Drug ──┐
//!               ├──► apply_patch ──► merged Drug ──► validate ──► diff_drug
//! DrugPatch ────┘                                                  │
//!                                                                  ▼
//!                                       [ {field: "stock", old: 10, new: 7} ]
//! ```
//!
//! Only the fields in [`DrugField::ALL`] are tracked. Lock and delete flags
//! change through lifecycle actions and are not part of the log.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use ts_rs::TS;

use crate::types::{Drug, DrugPatch, FieldChange};

/// A tracked drug field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum DrugField {
    Name,
    Code,
    Category,
    Manufacturer,
    /// Logged in cents.
    Price,
    Stock,
    MinStockThreshold,
    ExpiryDate,
    Description,
    SideEffects,
}

impl DrugField {
    /// Every tracked field, in log order.
    pub const ALL: [DrugField; 10] = [
        DrugField::Name,
        DrugField::Code,
        DrugField::Category,
        DrugField::Manufacturer,
        DrugField::Price,
        DrugField::Stock,
        DrugField::MinStockThreshold,
        DrugField::ExpiryDate,
        DrugField::Description,
        DrugField::SideEffects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrugField::Name => "name",
            DrugField::Code => "code",
            DrugField::Category => "category",
            DrugField::Manufacturer => "manufacturer",
            DrugField::Price => "price",
            DrugField::Stock => "stock",
            DrugField::MinStockThreshold => "minStockThreshold",
            DrugField::ExpiryDate => "expiryDate",
            DrugField::Description => "description",
            DrugField::SideEffects => "sideEffects",
        }
    }

    /// Reads this field from a drug as a JSON value.
    pub fn value_of(&self, drug: &Drug) -> Value {
        match self {
            DrugField::Name => json!(drug.name),
            DrugField::Code => json!(drug.code),
            DrugField::Category => json!(drug.category),
            DrugField::Manufacturer => json!(drug.manufacturer),
            DrugField::Price => json!(drug.price_cents),
            DrugField::Stock => json!(drug.stock),
            DrugField::MinStockThreshold => json!(drug.min_stock_threshold),
            DrugField::ExpiryDate => json!(drug.expiry_date.format("%Y-%m-%d").to_string()),
            DrugField::Description => json!(drug.description),
            DrugField::SideEffects => json!(drug.side_effects),
        }
    }
}

impl std::fmt::Display for DrugField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn clean(value: &str) -> String {
    value.trim().to_string()
}

fn clean_optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Merges a patch into a copy of `drug`. The result is not validated.
pub fn apply_patch(drug: &Drug, patch: &DrugPatch) -> Drug {
    let mut merged = drug.clone();

    if let Some(name) = &patch.name {
        merged.name = clean(name);
    }
    if let Some(code) = &patch.code {
        merged.code = clean(code);
    }
    if let Some(category) = &patch.category {
        merged.category = clean(category);
    }
    if let Some(manufacturer) = &patch.manufacturer {
        merged.manufacturer = clean(manufacturer);
    }
    if let Some(price) = patch.price_cents {
        merged.price_cents = price;
    }
    if let Some(stock) = patch.stock {
        merged.stock = stock;
    }
    if let Some(threshold) = patch.min_stock_threshold {
        merged.min_stock_threshold = threshold;
    }
    if let Some(expiry) = patch.expiry_date {
        merged.expiry_date = expiry;
    }
    if let Some(description) = &patch.description {
        merged.description = clean_optional(description);
    }
    if let Some(side_effects) = &patch.side_effects {
        merged.side_effects = clean_optional(side_effects);
    }

    merged
}

/// Lists every tracked field whose value differs between `before` and `after`.
///
/// An empty result means nothing is logged.
pub fn diff_drug(before: &Drug, after: &Drug) -> Vec<FieldChange> {
    DrugField::ALL
        .iter()
        .filter_map(|field| {
            let old_value = field.value_of(before);
            let new_value = field.value_of(after);
            (old_value != new_value).then(|| FieldChange {
                field: *field,
                old_value,
                new_value,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
