//! Cart service: per-user cart mutations with serialized writes.

use common::{ProductId, UserId};
use doc_store::{DocumentStore, DocumentStoreExt, PutOptions, Revision, StoreError};

use crate::catalog::CatalogService;
use crate::collections;
use crate::error::{DomainError, Result};

use super::Cart;

/// Bound on compare-and-swap retries for contended cart mutations.
const MAX_CAS_RETRIES: usize = 16;

/// Service maintaining one cart per user.
///
/// Every mutation is a read-modify-write under compare-and-swap on the
/// cart document's revision, retried on conflict, so concurrent mutations
/// for the same user are serialized rather than lost.
pub struct CartService<S> {
    store: S,
    catalog: CatalogService<S>,
}

impl<S: DocumentStore + Clone> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        let catalog = CatalogService::new(store.clone());
        Self { store, catalog }
    }

    /// Returns the user's cart, creating an empty one if none exists.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart> {
        let key = user_id.to_string();
        if let Some((cart, _)) = self.store.get_as::<Cart>(collections::CARTS, &key).await? {
            return Ok(cart);
        }

        let cart = Cart::empty(user_id);
        match self
            .store
            .put_as(collections::CARTS, &key, &cart, PutOptions::expect_new())
            .await
        {
            Ok(_) => Ok(cart),
            // Someone else created it first; theirs wins.
            Err(StoreError::RevisionConflict { .. }) => {
                let (cart, _) = self
                    .store
                    .get_as::<Cart>(collections::CARTS, &key)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Cart", user_id))?;
                Ok(cart)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Adds a quantity of a product to the cart.
    ///
    /// Merging into an existing line adds the quantity and re-snapshots the
    /// unit price to the product's current effective price. Returns the
    /// updated cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_line(
        &self,
        user_id: UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        require_quantity(quantity)?;
        let product = self.catalog.find_by_id(product_id).await?;
        let unit_price = product.effective_price();

        self.mutate(user_id, |cart| {
            cart.merge_line(product_id.clone(), quantity, unit_price);
            Ok(())
        })
        .await
    }

    /// Sets a line's quantity absolutely. The price snapshot is kept.
    #[tracing::instrument(skip(self))]
    pub async fn update_line(
        &self,
        user_id: UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        require_quantity(quantity)?;

        self.mutate(user_id, |cart| {
            if !cart.set_line_quantity(product_id, quantity) {
                return Err(DomainError::not_found("Cart line", product_id));
            }
            Ok(())
        })
        .await
    }

    /// Removes the line for a product. A no-op if the line is absent.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, user_id: UserId, product_id: &ProductId) -> Result<Cart> {
        self.mutate(user_id, |cart| {
            cart.remove_line(product_id);
            Ok(())
        })
        .await
    }

    /// Empties the cart. The cart document itself persists.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart> {
        self.mutate(user_id, |cart| {
            cart.clear();
            Ok(())
        })
        .await
    }

    /// Read-modify-write on the user's cart under compare-and-swap.
    ///
    /// Loads the cart (lazily creating an empty one), applies the mutation,
    /// then writes back expecting the loaded revision. A conflicting write
    /// from another request re-runs the mutation on fresh state.
    async fn mutate<F>(&self, user_id: UserId, apply: F) -> Result<Cart>
    where
        F: Fn(&mut Cart) -> Result<()>,
    {
        let key = user_id.to_string();

        for _ in 0..MAX_CAS_RETRIES {
            let (mut cart, revision) = match self
                .store
                .get_as::<Cart>(collections::CARTS, &key)
                .await?
            {
                Some((cart, revision)) => (cart, revision),
                None => (Cart::empty(user_id), Revision::initial()),
            };

            apply(&mut cart)?;

            match self
                .store
                .put_as(
                    collections::CARTS,
                    &key,
                    &cart,
                    PutOptions::expect_revision(revision),
                )
                .await
            {
                Ok(_) => return Ok(cart),
                Err(StoreError::RevisionConflict { .. }) => {
                    tracing::debug!(%user_id, "cart revision conflict, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::InvalidInput(format!(
            "cart mutation for {user_id} kept conflicting, giving up"
        )))
    }
}

fn require_quantity(quantity: u32) -> Result<()> {
    if quantity < 1 {
        return Err(DomainError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use common::Money;
    use doc_store::InMemoryDocumentStore;

    async fn setup() -> (CartService<InMemoryDocumentStore>, CatalogService<InMemoryDocumentStore>) {
        let store = InMemoryDocumentStore::new();
        let catalog = CatalogService::new(store.clone());
        catalog
            .upsert(&Product::new("SKU-001", "Widget", Money::from_cents(1000), 5))
            .await
            .unwrap();
        catalog
            .upsert(&Product::new("SKU-002", "Gadget", Money::from_cents(2500), 3))
            .await
            .unwrap();
        (CartService::new(store), catalog)
    }

    #[tokio::test]
    async fn get_or_create_returns_empty_cart() {
        let (carts, _) = setup().await;
        let user_id = UserId::new();

        let cart = carts.get_or_create(user_id).await.unwrap();
        assert_eq!(cart.user_id, user_id);
        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());
    }

    #[tokio::test]
    async fn get_or_create_is_lazy_and_stable() {
        let (carts, _) = setup().await;
        let user_id = UserId::new();

        carts
            .add_line(user_id, &ProductId::new("SKU-001"), 2)
            .await
            .unwrap();
        let cart = carts.get_or_create(user_id).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn add_line_snapshots_effective_price() {
        let (carts, catalog) = setup().await;
        let user_id = UserId::new();

        catalog
            .upsert(
                &Product::new("SKU-003", "Sale Item", Money::from_cents(2000), 5)
                    .with_sale_price(Money::from_cents(1500)),
            )
            .await
            .unwrap();

        let cart = carts
            .add_line(user_id, &ProductId::new("SKU-003"), 1)
            .await
            .unwrap();
        assert_eq!(
            cart.line(&ProductId::new("SKU-003")).unwrap().unit_price,
            Money::from_cents(1500)
        );
    }

    #[tokio::test]
    async fn add_line_merge_refreshes_price_snapshot() {
        let (carts, catalog) = setup().await;
        let user_id = UserId::new();
        let product_id = ProductId::new("SKU-001");

        carts.add_line(user_id, &product_id, 2).await.unwrap();

        // Catalog price drops between the two adds.
        catalog
            .upsert(&Product::new("SKU-001", "Widget", Money::from_cents(800), 5))
            .await
            .unwrap();

        let cart = carts.add_line(user_id, &product_id, 1).await.unwrap();
        let line = cart.line(&product_id).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Money::from_cents(800));
        assert_eq!(cart.total, Money::from_cents(2400));
    }

    #[tokio::test]
    async fn add_line_unknown_product_is_not_found() {
        let (carts, _) = setup().await;
        let result = carts
            .add_line(UserId::new(), &ProductId::new("SKU-404"), 1)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn add_line_zero_quantity_is_invalid() {
        let (carts, _) = setup().await;
        let result = carts
            .add_line(UserId::new(), &ProductId::new("SKU-001"), 0)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn update_line_sets_quantity_absolutely() {
        let (carts, _) = setup().await;
        let user_id = UserId::new();
        let product_id = ProductId::new("SKU-001");

        carts.add_line(user_id, &product_id, 2).await.unwrap();
        let cart = carts.update_line(user_id, &product_id, 5).await.unwrap();

        assert_eq!(cart.line(&product_id).unwrap().quantity, 5);
        assert_eq!(cart.total, Money::from_cents(5000));
    }

    #[tokio::test]
    async fn update_line_missing_is_not_found() {
        let (carts, _) = setup().await;
        let result = carts
            .update_line(UserId::new(), &ProductId::new("SKU-001"), 2)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn remove_line_is_idempotent() {
        let (carts, _) = setup().await;
        let user_id = UserId::new();
        let product_id = ProductId::new("SKU-001");

        carts.add_line(user_id, &product_id, 2).await.unwrap();
        let cart = carts.remove_line(user_id, &product_id).await.unwrap();
        assert!(cart.is_empty());

        // Absent line: still fine.
        let cart = carts.remove_line(user_id, &product_id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());
    }

    #[tokio::test]
    async fn clear_keeps_cart_document() {
        let (carts, _) = setup().await;
        let user_id = UserId::new();

        carts
            .add_line(user_id, &ProductId::new("SKU-001"), 2)
            .await
            .unwrap();
        let cart = carts.clear(user_id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Money::zero());

        // The cart entity survives the clear.
        let reloaded = carts.get_or_create(user_id).await.unwrap();
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn mutation_retries_over_conflicting_writes() {
        let (carts, _) = setup().await;
        let user_id = UserId::new();

        // Concurrent adds for the same user; CAS retry means neither
        // write is lost regardless of interleaving.
        let sku_1 = ProductId::new("SKU-001");
        let sku_2 = ProductId::new("SKU-002");
        let (a, b) = tokio::join!(
            carts.add_line(user_id, &sku_1, 1),
            carts.add_line(user_id, &sku_2, 1),
        );
        a.unwrap();
        b.unwrap();

        let cart = carts.get_or_create(user_id).await.unwrap();
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.total, Money::from_cents(3500));
    }
}
