//! Domain error types.

use doc_store::StoreError;
use thiserror::Error;

/// Errors that can occur during storefront domain operations.
///
/// Every variant carries enough context for a caller to form a correct
/// user-facing message; nothing is swallowed.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity (product, cart line, order) does not exist.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// The caller supplied an invalid value (quantity below 1, missing
    /// shipping fields, missing payment token).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Checkout was attempted on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The payment gateway declined or was unreachable. The reason is
    /// passed through opaquely.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// The caller is not authorized for the requested order access.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Creates a `NotFound` error for the given entity kind and id.
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
