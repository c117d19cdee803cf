//! Order composition for the storefront.
//!
//! Checkout turns a non-empty cart into an immutable order:
//! 1. Validate input and snapshot cart lines against the catalog
//! 2. Compute totals (tax rounded to cents before summing)
//! 3. Persist a provisional checkout intent
//! 4. Charge the payment gateway (skipped for cash on delivery)
//! 5. Persist the order
//! 6. Best-effort stock decrement per line, floored at zero
//! 7. Clear the cart
//!
//! A gateway failure aborts before any order or stock change; failures
//! after the charge are logged and surfaced through the intent record
//! rather than rolled back, since the customer has already been charged.

pub mod config;
pub mod gateway;
pub mod intent;
pub mod pipeline;
pub mod totals;

pub use config::CheckoutConfig;
pub use gateway::{ChargeConfirmation, InMemoryPaymentGateway, PaymentError, PaymentGateway};
pub use intent::{CheckoutIntent, IntentState};
pub use pipeline::CheckoutPipeline;
pub use totals::OrderTotals;
