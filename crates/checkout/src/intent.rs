//! Checkout intent: the provisional record written before charging.
//!
//! Persisting the intent before invoking the gateway makes the
//! charge-then-crash window observable: an intent stuck in
//! `AwaitingPayment` or `Charged` marks a checkout that needs
//! reconciliation instead of a silently lost charge.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use serde::{Deserialize, Serialize};

/// Collection holding checkout intent documents, keyed by order id.
pub const CHECKOUT_INTENTS: &str = "checkout_intents";

/// The state of a checkout intent.
///
/// State transitions:
/// ```text
/// AwaitingPayment ──┬──► Charged ──► Completed
///                   └──► Failed
/// ```
/// (Cash-on-delivery checkouts skip `Charged` and go straight from
/// `AwaitingPayment` to `Completed`.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentState {
    /// Intent persisted, gateway not yet invoked.
    #[default]
    AwaitingPayment,

    /// Gateway charge succeeded; order persistence and side effects in
    /// progress.
    Charged,

    /// Order persisted, stock adjusted, cart cleared (terminal state).
    Completed,

    /// Gateway declined the charge; no order exists (terminal state).
    Failed,
}

impl IntentState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntentState::Completed | IntentState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentState::AwaitingPayment => "awaiting_payment",
            IntentState::Charged => "charged",
            IntentState::Completed => "completed",
            IntentState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for IntentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provisional checkout record keyed by the order id it will produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutIntent {
    /// The id the composed order will be persisted under.
    pub order_id: OrderId,

    /// The user checking out.
    pub user_id: UserId,

    /// The total that was (or will be) charged.
    pub amount: Money,

    pub state: IntentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutIntent {
    /// Creates a new intent in `AwaitingPayment`.
    pub fn new(order_id: OrderId, user_id: UserId, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            user_id,
            amount,
            state: IntentState::AwaitingPayment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the intent to a new state, stamping `updated_at`.
    pub fn advance(&mut self, state: IntentState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}
