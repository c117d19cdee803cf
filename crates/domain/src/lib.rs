//! Domain layer for the storefront.
//!
//! This crate provides the core storefront domain:
//! - Catalog: products with effective (sale-aware) pricing and stock
//! - Cart aggregator: one cart per user with derived totals
//! - Orders: immutable order records with a status lifecycle
//!
//! All services are thin async layers over a [`doc_store::DocumentStore`];
//! mutations use compare-and-swap on document revisions so concurrent
//! writes for the same user or product cannot lose updates.

pub mod cart;
pub mod catalog;
pub mod collections;
pub mod error;
pub mod order;

pub use cart::{Cart, CartLine, CartService};
pub use catalog::{CatalogService, Product};
pub use error::{DomainError, Result};
pub use order::{
    Order, OrderLine, OrderService, OrderStatus, PaymentMethod, ShippingAddress,
};
