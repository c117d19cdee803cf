//! Order status lifecycle.

use serde::{Deserialize, Serialize};

/// The status of an order.
///
/// Expected progression:
/// ```text
/// Pending ──► Paid ──► Shipped ──► Delivered
///    │          │         │
///    └──────────┴─────────┴──► Cancelled
/// ```
/// `Delivered` and `Cancelled` are terminal by convention only: status
/// updates out of them are permitted but logged as suspicious by the
/// order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment (cash on delivery starts here).
    Pending,

    /// Payment captured (gateway-paid orders start here).
    Paid,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal by convention).
    Delivered,

    /// Cancelled by an administrator (terminal by convention).
    Cancelled,
}

impl OrderStatus {
    /// Returns true for the conventionally terminal statuses.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
