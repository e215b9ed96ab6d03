//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │ SalesLogEntry   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  customer_id    │   │  order_id       │       │
//! │  │  name           │   │  name           │   │  customer_id    │       │
//! │  │  price (Money)  │   │  password       │   │  date           │       │
//! │  │  stock          │   │                 │   │  total (Money)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────┐                        │
//! │  │    Order (derived at checkout, not stored)  │                        │
//! │  │  order_id, customer_id, date, lines, total  │                        │
//! │  └─────────────────────────────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every type here is typed; the CSV tables are not. Conversion between the
//! two lives in `tally-store`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique business identifier, e.g. `P001`.
    pub product_id: String,

    /// Display name shown on the bill.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Units on hand.
    pub stock: i64,
}

impl Product {
    /// Creates a product.
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: Money, stock: i64) -> Self {
        Product {
            product_id: product_id.into(),
            name: name.into(),
            price,
            stock,
        }
    }

    /// Checks if `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Whether the product falls under the low-stock threshold.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock < threshold
    }
}

/// Partial update for a product; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer.
///
/// The password is kept in plain text in `customers.csv`; it is never
/// serialized to command output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Customer {
    /// Creates a customer.
    pub fn new(
        customer_id: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Customer {
            customer_id: customer_id.into(),
            name: name.into(),
            password: password.into(),
        }
    }
}

// =============================================================================
// Sales Ledger
// =============================================================================

/// One row of the append-only sales ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesLogEntry {
    pub order_id: String,
    pub customer_id: String,
    /// Written as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub total: Money,
}

// =============================================================================
// Order
// =============================================================================

/// A finalized order.
///
/// Uses the snapshot pattern: `lines` are copied from the cart, so later
/// catalog edits never change what the customer was billed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub lines: Vec<CartLine>,
    pub total: Money,
}

impl Order {
    /// Builds the ledger row for this order.
    pub fn to_log_entry(&self) -> SalesLogEntry {
        SalesLogEntry {
            order_id: self.order_id.clone(),
            customer_id: self.customer_id.clone(),
            date: self.date,
            total: self.total,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_can_sell() {
        let pen = Product::new("P001", "Pen", Money::from_cents(1000), 10);
        assert!(pen.can_sell(10));
        assert!(!pen.can_sell(11));
    }

    #[test]
    fn test_low_stock_is_strict() {
        let pen = Product::new("P001", "Pen", Money::from_cents(1000), 5);
        assert!(!pen.is_low_stock(5));
        assert!(pen.is_low_stock(6));
    }

    #[test]
    fn test_customer_password_not_serialized() {
        let customer = Customer::new("C1", "Asha", "secret");
        let json = serde_json::to_string(&customer).unwrap();
        assert!(json.contains("Asha"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_order_to_log_entry() {
        let order = Order {
            order_id: "ORD1".to_string(),
            customer_id: "C1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
            lines: Vec::new(),
            total: Money::from_cents(3000),
        };
        let entry = order.to_log_entry();
        assert_eq!(entry.order_id, "ORD1");
        assert_eq!(entry.total.cents(), 3000);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch {
            stock: Some(3),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
