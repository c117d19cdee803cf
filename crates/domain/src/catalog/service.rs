//! Catalog service: product lookup and stock adjustment.

use common::ProductId;
use doc_store::{DocumentStore, DocumentStoreExt, PutOptions, StoreError};

use crate::collections;
use crate::error::{DomainError, Result};

use super::Product;

/// Bound on compare-and-swap retries for contended stock updates.
const MAX_CAS_RETRIES: usize = 16;

/// Service for reading products and adjusting stock levels.
pub struct CatalogService<S> {
    store: S,
}

impl<S: DocumentStore> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, product_id: &ProductId) -> Result<Product> {
        self.store
            .get_as::<Product>(collections::PRODUCTS, product_id.as_str())
            .await?
            .map(|(product, _)| product)
            .ok_or_else(|| DomainError::not_found("Product", product_id))
    }

    /// Inserts or replaces a product document.
    pub async fn upsert(&self, product: &Product) -> Result<()> {
        self.store
            .put_as(
                collections::PRODUCTS,
                product.id.as_str(),
                product,
                PutOptions::new(),
            )
            .await?;
        Ok(())
    }

    /// Returns all products, sorted by name.
    pub async fn list(&self) -> Result<Vec<Product>> {
        let docs = self.store.list(collections::PRODUCTS).await?;
        let mut products = docs
            .iter()
            .map(|doc| doc.decode::<Product>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    /// Applies a stock delta, flooring the result at zero.
    ///
    /// The update is a compare-and-swap loop on the product document, so
    /// concurrent adjustments cannot lose decrements. Returns the new stock
    /// count.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_stock(&self, product_id: &ProductId, delta: i64) -> Result<u32> {
        for _ in 0..MAX_CAS_RETRIES {
            let (mut product, revision) = self
                .store
                .get_as::<Product>(collections::PRODUCTS, product_id.as_str())
                .await?
                .ok_or_else(|| DomainError::not_found("Product", product_id))?;

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let adjusted = (i64::from(product.count_in_stock) + delta).max(0) as u32;
            product.count_in_stock = adjusted;

            match self
                .store
                .put_as(
                    collections::PRODUCTS,
                    product_id.as_str(),
                    &product,
                    PutOptions::expect_revision(revision),
                )
                .await
            {
                Ok(_) => return Ok(adjusted),
                Err(StoreError::RevisionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::InvalidInput(format!(
            "stock adjustment for {product_id} kept conflicting, giving up"
        )))
    }
}
