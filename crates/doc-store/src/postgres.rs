use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, Result, Revision, StoreError,
    store::{DocumentStore, PutOptions},
};

/// PostgreSQL-backed document store.
///
/// Documents live in a single `documents` table keyed by
/// `(collection, id)` with a JSONB payload. Compare-and-swap writes take a
/// row lock on the current revision inside a transaction.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `documents` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT        NOT NULL,
                id         TEXT        NOT NULL,
                revision   BIGINT      NOT NULL,
                payload    JSONB       NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_document(row: &PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            id: row.try_get("id")?,
            revision: Revision::new(row.try_get("revision")?),
            payload: row.try_get("payload")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT collection, id, revision, payload, updated_at
             FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    #[tracing::instrument(skip(self, payload, options), fields(collection, id))]
    async fn put(
        &self,
        collection: &str,
        id: &str,
        payload: serde_json::Value,
        options: PutOptions,
    ) -> Result<Revision> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar(
            "SELECT revision FROM documents
             WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.map_or_else(Revision::initial, Revision::new);

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
        let now = chrono::Utc::now();

        if current == Revision::initial() {
            sqlx::query(
                "INSERT INTO documents (collection, id, revision, payload, updated_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(collection)
            .bind(id)
            .bind(next.as_i64())
            .bind(&payload)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE documents SET revision = $3, payload = $4, updated_at = $5
                 WHERE collection = $1 AND id = $2",
            )
            .bind(collection)
            .bind(id)
            .bind(next.as_i64())
            .bind(&payload)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(next)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT collection, id, revision, payload, updated_at
             FROM documents WHERE collection = $1",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_document).collect()
    }
}
