//! # optika-core: Pure Business Logic for Optika POS
//!
//! This crate is the **heart** of Optika POS. It contains the entire
//! checkout computation as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Optika POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 optika-checkout (Orchestrator)                  │   │
//! │  │    cart session ──► split prompt ──► checkout transaction       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ optika-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐          │   │
//! │  │   │  money  │ │ pricing │ │ inventory │ │ workorder│          │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └──────────┘          │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐          │   │
//! │  │   │  types  │ │  fees   │ │  loyalty  │ │commission│          │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    optika-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, Sale, WorkOrder, Terminal, etc.)
//! - [`money`] - Money and Rate with integer arithmetic (no floating point!)
//! - [`pricing`] - Cart totals and discounts
//! - [`inventory`] - Stock reservation planning
//! - [`fees`] - Customer-side terminal fee resolution
//! - [`commission`] - Bank-side commission expenses
//! - [`workorder`] - Lab work-order derivation
//! - [`loyalty`] - Loyalty point awards
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use optika_core::money::{Money, Rate};
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(80_000); // $800.00
//!
//! // Apply a rate with half-up rounding
//! let fee = price.apply_rate(Rate::from_bps(350)); // 3.5%
//! assert_eq!(fee.cents(), 2_800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commission;
pub mod error;
pub mod fees;
pub mod inventory;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod workorder;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use optika_core::Money` instead of
// `use optika_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default branch ID for single-location deployments.
///
/// The schema carries branch_id everywhere so a second location is a data
/// change, not a migration. Until then this constant is the only branch.
pub const DEFAULT_BRANCH_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum items allowed in a single cart.
///
/// Prevents runaway carts and keeps tickets a human can review at the
/// counter.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
