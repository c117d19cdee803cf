use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    document::{Document, Revision},
    error::Result,
};

/// Options for writing a document.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Expected current revision of the document, for optimistic
    /// concurrency control. If None, the write is unconditional
    /// (last write wins).
    pub expected_revision: Option<Revision>,
}

impl PutOptions {
    /// Creates options with no revision check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific revision.
    pub fn expect_revision(revision: Revision) -> Self {
        Self {
            expected_revision: Some(revision),
        }
    }

    /// Creates options expecting the document to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_revision: Some(Revision::initial()),
        }
    }
}

/// Core trait for document store implementations.
///
/// A document store persists JSON documents in named collections, keyed by a
/// string id. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document, or None if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Writes a document, replacing any existing payload.
    ///
    /// If `options.expected_revision` is set, the write fails with
    /// `RevisionConflict` when the document's current revision differs
    /// (a missing document is at `Revision::initial()`).
    ///
    /// Returns the document's new revision.
    async fn put(
        &self,
        collection: &str,
        id: &str,
        payload: serde_json::Value,
        options: PutOptions,
    ) -> Result<Revision>;

    /// Deletes a document. Returns true if it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Retrieves all documents in a collection, in no particular order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;
}

/// Extension trait providing typed convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Retrieves and deserializes a document, together with its revision.
    async fn get_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(T, Revision)>> {
        match self.get(collection, id).await? {
            Some(doc) => Ok(Some((doc.decode()?, doc.revision))),
            None => Ok(None),
        }
    }

    /// Serializes and writes a typed value as a document.
    async fn put_as<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
        options: PutOptions,
    ) -> Result<Revision> {
        let payload = serde_json::to_value(value)?;
        self.put(collection, id, payload, options).await
    }

    /// Checks whether a document exists.
    async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}
