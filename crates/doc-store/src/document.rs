use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Monotonically increasing revision number of a document.
///
/// A document that has never been written is at [`Revision::initial`] (0);
/// the first write produces revision 1. Revisions are the handle for
/// compare-and-swap writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    /// Creates a revision from a raw number.
    pub fn new(revision: i64) -> Self {
        Self(revision)
    }

    /// The revision of a document that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next revision.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw revision number.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored document: a JSON payload plus its location and revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Collection the document belongs to (e.g. `"carts"`).
    pub collection: String,

    /// Document id, unique within its collection.
    pub id: String,

    /// Current revision, incremented on every write.
    pub revision: Revision,

    /// The document body.
    pub payload: serde_json::Value,

    /// Timestamp of the last write.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Deserializes the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}
