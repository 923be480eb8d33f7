//! # apotheca-core: Pure Business Logic for Apotheca POS
//!
//! This crate holds the pharmacy's business rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Apotheca POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web client (SPA)                             │   │
//! │  │    Inventory ──► Recycle bin ──► Sales ──► Dashboard           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON + bearer token               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    api-server (axum)                            │   │
//! │  │    auth gate, routes, response envelope                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ apotheca-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ lifecycle │ │  diff  │ │  sale  │  │   │
//! │  │   │  Drug   │ │  Money  │ │  delete/  │ │ field  │ │ price  │  │   │
//! │  │   │  Sale   │ │         │ │  restore  │ │ changes│ │  cart  │  │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apotheca-db (Database Layer)                    │   │
//! │  │          SQLite queries, migrations, sale transaction           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Drug, SaleRecord, User, Identity, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`lifecycle`] - Soft-delete / lock / restore state machine
//! - [`diff`] - Field-level change sets for the modification log
//! - [`sale`] - Cart pricing and stock checks
//!
//! ## Example Usage
//!
//! ```rust
//! use apotheca_core::money::Money;
//!
//! let price = Money::from_cents(1250); // 12.50
//! assert_eq!(price.multiply_quantity(3).cents(), 3750);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod diff;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use diff::DrugField;
pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::{DrugAction, StateChange, Transition};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single sale line.
///
/// ## Business Reason
/// Catches slips at the counter (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Low-stock threshold applied when a new drug doesn't specify one.
pub const DEFAULT_MIN_STOCK_THRESHOLD: i64 = 10;
