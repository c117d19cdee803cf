//! Document store for the storefront.
//!
//! Persistence is modelled as named collections of JSON documents keyed by a
//! string id. Every document carries a [`Revision`] that increases on each
//! write; callers can pass an expected revision to [`DocumentStore::put`] to
//! get compare-and-swap semantics, which is how cart mutations are
//! serialized per user.
//!
//! Two backends are provided: [`InMemoryDocumentStore`] for tests and
//! [`PostgresDocumentStore`] (single JSONB table) for durable deployments.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use document::{Document, Revision};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt, PutOptions};
