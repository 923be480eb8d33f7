//! # Domain Types
//!
//! Core domain types used throughout Apotheca POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Drug       │   │   SaleRecord    │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (SKU)     │   │  total_cents    │   │  username       │       │
//! │  │  price_cents    │   │  cashier_id     │   │  role           │       │
//! │  │  stock          │   │  items[]        │   │  password_hash  │       │
//! │  │  is_locked      │   └────────┬────────┘   └─────────────────┘       │
//! │  │  is_deleted     │            │                                       │
//! │  └────────┬────────┘   ┌────────┴────────┐   ┌─────────────────┐       │
//! │           │            │    SaleItem     │   │    Identity     │       │
//! │  ┌────────┴────────┐   │  drug_name snap │   │  (token claims) │       │
//! │  │ModificationEntry│   │  unit price snap│   └─────────────────┘       │
//! │  │  changes[]      │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (drug code, username) - human-readable, potentially mutable
//!
//! ## Wire Format
//! All types serialize with camelCase field names. Money is integer cents,
//! expiry dates are `YYYY-MM-DD`, timestamps are RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::diff::DrugField;
use crate::money::Money;

// =============================================================================
// Role & Identity
// =============================================================================

/// A user's role. Admins can purge drugs and toggle locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Pharmacist,
}

impl Default for Role {
    fn default() -> Self {
        Role::Pharmacist
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller.
///
/// Extracted from the bearer token on every request and passed explicitly
/// into each operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub name: String,
}

impl Identity {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
///
/// The password hash never leaves the server: it is skipped on
/// serialization and excluded from the TypeScript binding.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    /// Display name shown on receipts and in logs.
    pub name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds the identity carried inside this user's tokens.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// Drug
// =============================================================================

/// Lifecycle state of a drug record.
///
/// ```text
///   Active ──delete──► Deleted ──purge──► (row removed)
///     ▲                   │
///     └─────restore───────┘
/// ```
/// `is_locked` is orthogonal to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DrugState {
    Active,
    Deleted,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable product code, unique among non-deleted drugs.
    pub code: String,

    pub name: String,
    pub category: String,
    pub manufacturer: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Low-stock alert level: the drug is low when `stock <= min_stock_threshold`.
    pub min_stock_threshold: i64,

    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    pub description: Option<String>,
    pub side_effects: Option<String>,

    /// Locked drugs cannot be soft-deleted or purged from the active state.
    pub is_locked: bool,

    pub is_deleted: bool,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// User id of whoever moved the drug to the recycle bin.
    pub deleted_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// User id of whoever created the record.
    pub created_by: Option<String>,
}

impl Drug {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn state(&self) -> DrugState {
        if self.is_deleted {
            DrugState::Deleted
        } else {
            DrugState::Active
        }
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock_threshold
    }

    /// Checks if the drug can cover `quantity` units of a sale.
    pub fn can_sell(&self, quantity: i64) -> bool {
        !self.is_deleted && self.stock >= quantity
    }
}

/// A drug together with its audit trail and the display names of the
/// users who created and deleted it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DrugView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub drug: Drug,
    pub created_by_name: Option<String>,
    pub deleted_by_name: Option<String>,
    /// Newest entry first.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub history: Vec<ModificationEntry>,
}

/// Input for creating a drug.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewDrug {
    pub code: String,
    pub name: String,
    pub category: String,
    pub manufacturer: String,
    pub price_cents: i64,
    pub stock: i64,
    /// Falls back to [`crate::DEFAULT_MIN_STOCK_THRESHOLD`] when omitted.
    #[serde(default)]
    pub min_stock_threshold: Option<i64>,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
}

/// Partial update of a drug's tracked fields.
///
/// Absent fields are left unchanged. An empty `description` or
/// `sideEffects` string clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DrugPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub min_stock_threshold: Option<i64>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub side_effects: Option<String>,
}

impl DrugPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.category.is_none()
            && self.manufacturer.is_none()
            && self.price_cents.is_none()
            && self.stock.is_none()
            && self.min_stock_threshold.is_none()
            && self.expiry_date.is_none()
            && self.description.is_none()
            && self.side_effects.is_none()
    }
}

// =============================================================================
// Modification Log
// =============================================================================

/// One field's before/after values within a modification entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: DrugField,
    #[ts(type = "unknown")]
    pub old_value: serde_json::Value,
    #[ts(type = "unknown")]
    pub new_value: serde_json::Value,
}

/// An append-only audit record: one per update that changed something.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModificationEntry {
    pub id: String,
    pub drug_id: String,
    #[ts(as = "String")]
    pub changed_at: DateTime<Utc>,
    /// User id of the editor.
    pub changed_by: String,
    pub changed_by_name: Option<String>,
    pub changes: Vec<FieldChange>,
}

// =============================================================================
// Sales
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze drug data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Kept after the drug is purged; it simply stops resolving.
    pub drug_id: String,
    /// Drug name at time of sale (frozen).
    pub drug_name: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A completed sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub cashier_id: String,
    pub cashier_name: Option<String>,
    /// `None` for walk-in customers.
    pub customer_name: Option<String>,
    /// In cart order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl SaleRecord {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One requested line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub drug_id: String,
    pub quantity: i64,
}

/// Body of a sale submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// Result of a batch soft-delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteOutcome {
    pub deleted: u64,
    pub skipped_locked: u64,
    /// Ids that were unknown or already in the recycle bin.
    pub skipped_missing: u64,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub low_stock_count: i64,
    /// Active (non-deleted) drugs.
    pub total_products: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
