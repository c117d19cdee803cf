//! Order service: persistence, access control and status updates.

use chrono::Utc;
use common::{OrderId, UserId};
use doc_store::{DocumentStore, DocumentStoreExt, PutOptions, StoreError};

use crate::collections;
use crate::error::{DomainError, Result};

use super::{Order, OrderStatus};

/// Bound on compare-and-swap retries for contended status updates.
const MAX_CAS_RETRIES: usize = 16;

/// Service for reading orders and updating their status.
pub struct OrderService<S> {
    store: S,
}

impl<S: DocumentStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a freshly composed order as a new document.
    pub async fn insert(&self, order: &Order) -> Result<()> {
        self.store
            .put_as(
                collections::ORDERS,
                &order.id.to_string(),
                order,
                PutOptions::expect_new(),
            )
            .await?;
        Ok(())
    }

    /// Returns an order to its owner or an administrator.
    ///
    /// Fails with `NotFound` if absent and `Forbidden` if the requester
    /// neither owns the order nor is an admin.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: OrderId,
        requester: UserId,
        requester_is_admin: bool,
    ) -> Result<Order> {
        let order = self.load(order_id).await?;

        if !requester_is_admin && order.user_id != requester {
            return Err(DomainError::Forbidden(format!(
                "order {order_id} belongs to another user"
            )));
        }

        Ok(order)
    }

    /// Returns a user's orders, newest first.
    pub async fn list_user_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut orders = self.load_all().await?;
        orders.retain(|order| order.user_id == user_id);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Returns all orders, newest first. Admin only.
    pub async fn list_all_orders(&self, requester_is_admin: bool) -> Result<Vec<Order>> {
        if !requester_is_admin {
            return Err(DomainError::Forbidden(
                "listing all orders requires admin access".to_string(),
            ));
        }

        let mut orders = self.load_all().await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Sets an order's status.
    ///
    /// Moving to `Delivered` also stamps `delivered_at`; no other status
    /// ever clears it. Transitions out of a terminal status are permitted
    /// but logged. The admin capability is enforced by the caller.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, new_status: OrderStatus) -> Result<Order> {
        let key = order_id.to_string();

        for _ in 0..MAX_CAS_RETRIES {
            let (mut order, revision) = self
                .store
                .get_as::<Order>(collections::ORDERS, &key)
                .await?
                .ok_or_else(|| DomainError::not_found("Order", order_id))?;

            if order.status.is_terminal() && new_status != order.status {
                tracing::warn!(
                    %order_id,
                    from = %order.status,
                    to = %new_status,
                    "status transition out of a terminal state"
                );
            }

            order.status = new_status;
            if new_status == OrderStatus::Delivered {
                order.delivered_at = Some(Utc::now());
            }

            match self
                .store
                .put_as(
                    collections::ORDERS,
                    &key,
                    &order,
                    PutOptions::expect_revision(revision),
                )
                .await
            {
                Ok(_) => return Ok(order),
                Err(StoreError::RevisionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::InvalidInput(format!(
            "status update for order {order_id} kept conflicting, giving up"
        )))
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_as::<Order>(collections::ORDERS, &order_id.to_string())
            .await?
            .map(|(order, _)| order)
            .ok_or_else(|| DomainError::not_found("Order", order_id))
    }

    async fn load_all(&self) -> Result<Vec<Order>> {
        let docs = self.store.list(collections::ORDERS).await?;
        docs.iter()
            .map(|doc| doc.decode::<Order>().map_err(DomainError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderLine, PaymentMethod, ShippingAddress};
    use common::{Money, ProductId};
    use doc_store::InMemoryDocumentStore;

    fn sample_order(user_id: UserId) -> Order {
        Order {
            id: OrderId::new(),
            user_id,
            lines: vec![OrderLine {
                product_id: ProductId::new("SKU-001"),
                name: "Widget".to_string(),
                image: None,
                unit_price: Money::from_cents(1000),
                quantity: 2,
            }],
            shipping_address: ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
            payment_method: PaymentMethod::CashOnDelivery,
            payment_result: None,
            subtotal: Money::from_cents(2000),
            tax: Money::from_cents(100),
            shipping: Money::from_cents(500),
            total_price: Money::from_cents(2600),
            status: OrderStatus::Pending,
            paid_at: None,
            delivered_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn owner_can_read_own_order() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let user_id = UserId::new();
        let order = sample_order(user_id);
        service.insert(&order).await.unwrap();

        let loaded = service.get_order(order.id, user_id, false).await.unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn admin_can_read_any_order() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let order = sample_order(UserId::new());
        service.insert(&order).await.unwrap();

        let loaded = service.get_order(order.id, UserId::new(), true).await.unwrap();
        assert_eq!(loaded.id, order.id);
    }

    #[tokio::test]
    async fn other_user_is_forbidden() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let order = sample_order(UserId::new());
        service.insert(&order).await.unwrap();

        let result = service.get_order(order.id, UserId::new(), false).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let result = service.get_order(OrderId::new(), UserId::new(), true).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_user_orders_filters_and_sorts_newest_first() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let user_id = UserId::new();

        let mut first = sample_order(user_id);
        first.created_at = Utc::now() - chrono::Duration::hours(1);
        let second = sample_order(user_id);
        let other = sample_order(UserId::new());

        service.insert(&first).await.unwrap();
        service.insert(&second).await.unwrap();
        service.insert(&other).await.unwrap();

        let orders = service.list_user_orders(user_id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders[1].id, first.id);
    }

    #[tokio::test]
    async fn list_all_orders_requires_admin() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        service.insert(&sample_order(UserId::new())).await.unwrap();

        let result = service.list_all_orders(false).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        let orders = service.list_all_orders(true).await.unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn delivered_stamps_delivered_at() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let order = sample_order(UserId::new());
        service.insert(&order).await.unwrap();

        let updated = service
            .update_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Delivered);
        assert!(updated.delivered_at.is_some());
    }

    #[tokio::test]
    async fn other_statuses_never_clear_delivered_at() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let order = sample_order(UserId::new());
        service.insert(&order).await.unwrap();

        let delivered = service
            .update_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        let delivered_at = delivered.delivered_at;

        // Permissive model: moving out of a terminal state is allowed.
        let reopened = service
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(reopened.status, OrderStatus::Shipped);
        assert_eq!(reopened.delivered_at, delivered_at);
    }

    #[tokio::test]
    async fn update_status_missing_order_is_not_found() {
        let service = OrderService::new(InMemoryDocumentStore::new());
        let result = service
            .update_status(OrderId::new(), OrderStatus::Cancelled)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
