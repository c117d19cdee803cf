use thiserror::Error;

use crate::document::Revision;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected revision did not match the document's current revision.
    #[error("Revision conflict for {collection}/{id}: expected {expected}, found {actual}")]
    RevisionConflict {
        collection: String,
        id: String,
        expected: Revision,
        actual: Revision,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
