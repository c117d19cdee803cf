//! Order totals computation.

use common::Money;
use domain::OrderLine;
use serde::{Deserialize, Serialize};

use crate::config::CheckoutConfig;

/// The computed money breakdown of an order.
///
/// `total_price = subtotal + tax + shipping`, with tax rounded to whole
/// cents before being added, not after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_price: Money,
}

impl OrderTotals {
    /// Computes totals for the given order lines.
    ///
    /// Shipping is a flat fee regardless of cart size.
    pub fn compute(lines: &[OrderLine], config: &CheckoutConfig) -> Self {
        let subtotal = lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total());
        let tax = subtotal.scale(config.tax_rate);
        let shipping = config.shipping_flat;

        Self {
            subtotal,
            tax,
            shipping,
            total_price: subtotal + tax + shipping,
        }
    }
}
