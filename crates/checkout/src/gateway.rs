//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A charge was declined or the gateway was unreachable.
///
/// The reason is passed through opaquely to the caller.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PaymentError(pub String);

/// Opaque confirmation returned by a successful charge.
///
/// Stored as-is on the order's `payment_result`; the storefront never
/// interprets it beyond serializing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeConfirmation {
    /// Gateway-assigned confirmation id.
    pub confirmation_id: String,

    /// Gateway-reported status string (e.g. `"succeeded"`).
    pub status: String,
}

/// Trait for the external payment capability.
///
/// A charge is treated as synchronous and atomic: it either returns a
/// confirmation or fails, and whatever timeout the gateway enforces is
/// inherited as-is.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount (in minor currency units) against a
    /// payment token.
    async fn charge(
        &self,
        amount: Money,
        currency: &str,
        token: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ChargeConfirmation, PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: Vec<(String, Money)>,
    next_id: u32,
    fail_on_charge: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline the next charge calls.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Returns the number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns the amount of the most recent charge, if any.
    pub fn last_charge_amount(&self) -> Option<Money> {
        self.state
            .read()
            .unwrap()
            .charges
            .last()
            .map(|(_, amount)| *amount)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self,
        amount: Money,
        _currency: &str,
        token: &str,
        _metadata: HashMap<String, String>,
    ) -> Result<ChargeConfirmation, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_charge {
            return Err(PaymentError("card declined".to_string()));
        }

        state.next_id += 1;
        let confirmation_id = format!("CHG-{:04}", state.next_id);
        state.charges.push((token.to_string(), amount));

        Ok(ChargeConfirmation {
            confirmation_id,
            status: "succeeded".to_string(),
        })
    }
}
