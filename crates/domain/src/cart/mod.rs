//! Cart aggregator: one mutable cart per user with a derived total.

mod service;

pub use service::CartService;

use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    pub product_id: ProductId,

    /// Units of the product, always at least 1.
    pub quantity: u32,

    /// Price per unit, snapshotted from the product's effective price at
    /// the time the line was added or last merged. Never recomputed when
    /// the catalog price changes afterwards.
    pub unit_price: Money,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns `quantity × unit_price`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A user's cart: at most one line per product, insertion order kept.
///
/// Invariant: `total` always equals the sum of the line totals; every
/// structural mutation goes through a method that recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// The owning user. Carts are 1:1 with users.
    pub user_id: UserId,

    /// Cart lines, keyed uniquely by product id.
    pub lines: Vec<CartLine>,

    /// Derived sum of all line totals.
    pub total: Money,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
            total: Money::zero(),
        }
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Merges a quantity into the cart at the given unit price.
    ///
    /// If a line for the product exists, the quantity is added to it and
    /// the unit price is re-snapshotted to `unit_price`; otherwise a new
    /// line is appended.
    pub fn merge_line(&mut self, product_id: ProductId, quantity: u32, unit_price: Money) {
        match self.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity += quantity;
                line.unit_price = unit_price;
            }
            None => self.lines.push(CartLine::new(product_id, quantity, unit_price)),
        }
        self.recalculate_total();
    }

    /// Sets a line's quantity absolutely, without touching its price
    /// snapshot. Returns false if no line exists for the product.
    pub fn set_line_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        else {
            return false;
        };
        line.quantity = quantity;
        self.recalculate_total();
        true
    }

    /// Removes the line for a product if present. Idempotent.
    pub fn remove_line(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product_id != product_id);
        self.recalculate_total();
    }

    /// Empties all lines and resets the total to zero.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.total = Money::zero();
    }

    /// Recomputes `total` from the current lines.
    pub fn recalculate_total(&mut self) {
        self.total = self
            .lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::empty(UserId::new())
    }

    #[test]
    fn empty_cart_has_zero_total() {
        let cart = cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());
    }

    #[test]
    fn merge_appends_new_line() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("A"), 2, Money::from_cents(1000));

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total, Money::from_cents(2000));
    }

    #[test]
    fn merge_adds_quantity_and_resnapshots_price() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("A"), 2, Money::from_cents(1000));
        // Catalog price changed between the two adds.
        cart.merge_line(ProductId::new("A"), 1, Money::from_cents(800));

        let line = cart.line(&ProductId::new("A")).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Money::from_cents(800));
        assert_eq!(cart.total, Money::from_cents(2400));
    }

    #[test]
    fn set_quantity_is_absolute_and_keeps_price() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("A"), 2, Money::from_cents(1000));

        assert!(cart.set_line_quantity(&ProductId::new("A"), 5));
        let line = cart.line(&ProductId::new("A")).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.unit_price, Money::from_cents(1000));
        assert_eq!(cart.total, Money::from_cents(5000));
    }

    #[test]
    fn set_quantity_on_missing_line_reports_false() {
        let mut cart = cart();
        assert!(!cart.set_line_quantity(&ProductId::new("A"), 5));
    }

    #[test]
    fn remove_line_is_idempotent() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("A"), 2, Money::from_cents(1000));

        cart.remove_line(&ProductId::new("A"));
        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());

        // Removing again is a no-op, not an error.
        cart.remove_line(&ProductId::new("A"));
        assert!(cart.is_empty());
    }

    #[test]
    fn total_matches_lines_after_any_sequence() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("A"), 2, Money::from_cents(1000));
        cart.merge_line(ProductId::new("B"), 1, Money::from_cents(2500));
        cart.set_line_quantity(&ProductId::new("A"), 4);
        cart.merge_line(ProductId::new("C"), 3, Money::from_cents(100));
        cart.remove_line(&ProductId::new("B"));

        let expected = cart
            .lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total());
        assert_eq!(cart.total, expected);
        assert_eq!(cart.total, Money::from_cents(4300));
    }

    #[test]
    fn clear_empties_lines_and_total() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("A"), 2, Money::from_cents(1000));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut cart = cart();
        cart.merge_line(ProductId::new("B"), 1, Money::from_cents(100));
        cart.merge_line(ProductId::new("A"), 1, Money::from_cents(100));
        cart.merge_line(ProductId::new("B"), 1, Money::from_cents(100));

        let order: Vec<_> = cart.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }
}
