use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Document, Result, Revision, StoreError,
    store::{DocumentStore, PutOptions},
};

/// In-memory document store implementation for testing.
///
/// Stores all documents in memory behind an async lock and provides the
/// same revision semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, HashMap<String, Document>>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        payload: serde_json::Value,
        options: PutOptions,
    ) -> Result<Revision> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let current = docs
            .get(id)
            .map(|doc| doc.revision)
            .unwrap_or_else(Revision::initial);

        if let Some(expected) = options.expected_revision
            && current != expected
        {
            return Err(StoreError::RevisionConflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected,
                actual: current,
            });
        }

        let next = current.next();
        docs.insert(
            id.to_string(),
            Document {
                collection: collection.to_string(),
                id: id.to_string(),
                revision: next,
                payload,
                updated_at: Utc::now(),
            },
        );

        Ok(next)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }
}
