//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of Tally. It contains the inventory and
//! billing rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tally (apps/console)                           │   │
//! │  │    products ──► customers ──► checkout ──► reports              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │   bill    │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │  render   │  │   │
//! │  │   │ Customer  │  │  parsing  │  │ CartLine  │  │ text/rows │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO FILES • NO CONSOLE • PURE FUNCTIONS                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tally-store (Flat-File Layer)                  │   │
//! │  │          CSV tables, repositories, checkout, reports            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, SalesLogEntry, Order)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Per-session shopping cart
//! - [`bill`] - Bill rendering to text and tabular rows
//! - [`ids`] - Order and bill identifier generation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{Cart, Money, Product};
//!
//! let pen = Product::new("P001", "Pen", Money::from_cents(1000), 10);
//!
//! let mut cart = Cart::new();
//! cart.add_line(&pen, 3).unwrap();
//!
//! assert_eq!(cart.total(), Money::from_cents(3000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod cart;
pub mod error;
pub mod ids;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::Bill;
pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted, in cents ($1,000,000.00).
///
/// At this cap a full cart (100 lines of 999 units) totals about 10^13
/// cents, far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Products with stock strictly below this value show up in the low-stock report.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
