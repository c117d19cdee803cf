//! Shared value types used across the storefront crates.

pub mod types;

pub use types::{Money, OrderId, ProductId, UserId};
