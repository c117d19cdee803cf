//! Orders: immutable records composed from a cart at checkout.

mod service;
mod status;

pub use service::OrderService;
pub use status::OrderStatus;

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// An immutable snapshot of one purchased product.
///
/// Captured from the cart line and the product at order-creation time;
/// never touched afterwards, independent of later product edits or
/// deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The purchased product.
    pub product_id: ProductId,

    /// Product name at purchase time.
    pub name: String,

    /// First product image at purchase time, if any.
    pub image: Option<String>,

    /// Unit price as snapshotted in the cart.
    pub unit_price: Money,

    /// Units purchased.
    pub quantity: u32,
}

impl OrderLine {
    /// Returns `quantity × unit_price`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Where the order ships to. All fields are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Fails with `InvalidInput` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("street", &self.street),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidInput(format!(
                    "shipping address is missing {field}"
                )));
            }
        }
        Ok(())
    }
}

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Stripe,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Returns true for cash on delivery, which never touches the gateway.
    pub fn is_cash_on_delivery(&self) -> bool {
        matches!(self, PaymentMethod::CashOnDelivery)
    }

    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted order.
///
/// Created exactly once per checkout; immutable afterwards except for
/// `status`, `paid_at` and `delivered_at`, which change only through
/// [`OrderService::update_status`]. Never deleted.
///
/// Invariant: `total_price = subtotal + tax + shipping`, with tax rounded
/// to whole cents before the sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,

    /// Snapshotted lines, in cart insertion order.
    pub lines: Vec<OrderLine>,

    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,

    /// Opaque gateway confirmation; None for cash on delivery.
    pub payment_result: Option<serde_json::Value>,

    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_price: Money,

    pub status: OrderStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
