//! # Cart
//!
//! The per-session shopping cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Customer Action          Cart Method              Cart Change          │
//! │  ───────────────          ───────────              ───────────          │
//! │                                                                         │
//! │  Add product ────────────► add_line() ───────────► push or merge qty    │
//! │                                                                         │
//! │  Change quantity ────────► update_line() ────────► lines[i].qty = n     │
//! │                                                                         │
//! │  Remove product ─────────► remove_line() ────────► lines.remove(i)      │
//! │                                                                         │
//! │  Successful checkout ────► clear() ──────────────► lines.clear()        │
//! │                                                                         │
//! │  NOTE: The cart is never persisted. It lives exactly as long as the     │
//! │        session that owns it.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_cart_size, validate_price, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the shopping cart.
///
/// ## Price Freezing
/// `price` is copied from the catalog when the product is first added. If
/// the catalog price changes afterwards, the line keeps the original price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Unit price at time of adding (frozen)
    pub price: Money,

    /// Always positive
    pub qty: i64,
}

impl CartLine {
    /// Creates a line from a product snapshot.
    pub fn from_product(product: &Product, qty: i64) -> Self {
        CartLine {
            product_id: product.product_id.clone(),
            name: product.name.clone(),
            price: product.price,
            qty,
        }
    }

    /// Unit price × quantity.
    pub fn subtotal(&self) -> Money {
        self.price.multiply_quantity(self.qty)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges quantity)
/// - Every quantity is > 0
/// - Maximum lines: 100, maximum quantity per line: 999
/// - Insertion order is preserved (bills list lines in the order added)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// `product` must come from a live catalog lookup: its `stock` is the
    /// availability the merged quantity is checked against.
    ///
    /// ## Errors
    /// - `Validation` if `qty` is not positive or the price is out of range
    /// - `QuantityTooLarge` if the merged quantity would exceed 999
    /// - `InsufficientStock` if the merged quantity exceeds `product.stock`
    /// - `CartTooLarge` if a new line would exceed 100 lines
    ///
    /// The cart is unchanged whenever an error is returned.
    pub fn add_line(&mut self, product: &Product, qty: i64) -> CoreResult<()> {
        validate_quantity(qty)?;
        validate_price(product.price)?;

        let existing = self.line(&product.product_id).map(|l| l.qty).unwrap_or(0);
        let merged = existing + qty;

        if merged > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: merged,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if !product.can_sell(merged) {
            return Err(CoreError::InsufficientStock {
                product_id: product.product_id.clone(),
                available: product.stock,
                requested: merged,
            });
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.product_id)
        {
            line.qty = merged;
            return Ok(());
        }

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;

        self.lines.push(CartLine::from_product(product, qty));
        Ok(())
    }

    /// Replaces the quantity of an existing line.
    ///
    /// Stock is not re-checked here; use [`Cart::update_line_within`] when a
    /// live product is at hand.
    pub fn update_line(&mut self, product_id: &str, qty: i64) -> CoreResult<()> {
        validate_quantity(qty)?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.qty = qty;
                Ok(())
            }
            None => Err(CoreError::LineNotFound(product_id.to_string())),
        }
    }

    /// Replaces the quantity of an existing line after checking it against
    /// the product's current stock.
    pub fn update_line_within(&mut self, product: &Product, qty: i64) -> CoreResult<()> {
        if self.line(&product.product_id).is_none() {
            return Err(CoreError::LineNotFound(product.product_id.clone()));
        }

        if !product.can_sell(qty) {
            return Err(CoreError::InsufficientStock {
                product_id: product.product_id.clone(),
                available: product.stock,
                requested: qty,
            });
        }

        self.update_line(&product.product_id, qty)
    }

    /// Removes a line by product id and returns it.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        Ok(self.lines.remove(index))
    }

    /// Clears all lines. Called after a successful checkout.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price × qty` over all lines; zero for an empty cart.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Looks up a line by product id.
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// All lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.qty).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product::new(id, format!("Product {}", id), Money::from_cents(price_cents), stock)
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::new();
        let pen = product("P001", 1000, 10);

        cart.add_line(&pen, 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.total(), Money::from_cents(3000));
    }

    #[test]
    fn test_add_line_rejects_price_that_could_overflow() {
        let mut cart = Cart::new();
        let gold = product("P900", i64::MAX / 2, 100);

        let err = cart.add_line(&gold, 10).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "price"
        ));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());

        let dearest = product("P901", crate::MAX_PRICE_CENTS, 1000);
        cart.add_line(&dearest, MAX_ITEM_QUANTITY).unwrap();
        assert_eq!(
            cart.total().cents(),
            crate::MAX_PRICE_CENTS * MAX_ITEM_QUANTITY
        );
    }

    #[test]
    fn test_add_same_product_merges_quantity() {
        let mut cart = Cart::new();
        let pen = product("P001", 1000, 10);

        cart.add_line(&pen, 2).unwrap();
        cart.add_line(&pen, 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line("P001").unwrap().qty, 5);
    }

    #[test]
    fn test_add_line_insufficient_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        let pen = product("P001", 1000, 2);

        let err = cart.add_line(&pen, 5).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            }
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merged_quantity_checked_against_stock() {
        let mut cart = Cart::new();
        let pen = product("P001", 1000, 4);

        cart.add_line(&pen, 3).unwrap();
        assert!(cart.add_line(&pen, 2).is_err());
        assert_eq!(cart.line("P001").unwrap().qty, 3);
    }

    #[test]
    fn test_add_line_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let pen = product("P001", 1000, 10);

        assert!(matches!(
            cart.add_line(&pen, 0),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(cart.add_line(&pen, -1).is_err());
    }

    #[test]
    fn test_price_snapshot_survives_catalog_change() {
        let mut cart = Cart::new();
        let mut pen = product("P001", 1000, 10);
        cart.add_line(&pen, 1).unwrap();

        pen.price = Money::from_cents(1500);
        cart.add_line(&pen, 1).unwrap();

        let line = cart.line("P001").unwrap();
        assert_eq!(line.price, Money::from_cents(1000));
        assert_eq!(cart.total(), Money::from_cents(2000));
    }

    #[test]
    fn test_update_line() {
        let mut cart = Cart::new();
        cart.add_line(&product("P001", 250, 10), 1).unwrap();

        cart.update_line("P001", 4).unwrap();
        assert_eq!(cart.total(), Money::from_cents(1000));

        assert!(matches!(
            cart.update_line("P999", 1),
            Err(CoreError::LineNotFound(_))
        ));
        assert!(cart.update_line("P001", 0).is_err());
    }

    #[test]
    fn test_update_line_within_checks_stock() {
        let mut cart = Cart::new();
        let pen = product("P001", 250, 3);
        cart.add_line(&pen, 1).unwrap();

        assert!(matches!(
            cart.update_line_within(&pen, 4),
            Err(CoreError::InsufficientStock { .. })
        ));
        cart.update_line_within(&pen, 3).unwrap();
        assert_eq!(cart.line("P001").unwrap().qty, 3);
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new();
        cart.add_line(&product("P001", 1000, 10), 2).unwrap();

        let removed = cart.remove_line("P001").unwrap();
        assert_eq!(removed.qty, 2);
        assert!(cart.is_empty());

        assert!(matches!(
            cart.remove_line("P001"),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_total_of_empty_cart_is_zero() {
        assert_eq!(Cart::new().total(), Money::zero());
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add_line(&product("B", 100, 10), 1).unwrap();
        cart.add_line(&product("A", 100, 10), 1).unwrap();
        cart.add_line(&product("B", 100, 10), 1).unwrap();

        let ids: Vec<&str> = cart.lines().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_line(&product("P001", 999, 10), 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
