//! Checkout pipeline orchestrating cart-to-order composition.

use std::collections::HashMap;

use chrono::Utc;
use common::{OrderId, UserId};
use doc_store::{DocumentStore, DocumentStoreExt, PutOptions, Revision};
use domain::{
    CartService, CatalogService, DomainError, Order, OrderLine, OrderService, OrderStatus,
    PaymentMethod, Result, ShippingAddress,
};

use crate::config::CheckoutConfig;
use crate::gateway::PaymentGateway;
use crate::intent::{CHECKOUT_INTENTS, CheckoutIntent, IntentState};
use crate::totals::OrderTotals;

/// Composes orders from carts.
///
/// The pipeline is the only writer of order and checkout-intent documents.
/// Before the gateway is invoked a provisional [`CheckoutIntent`] is
/// persisted, so a crash between "charged" and "order persisted" leaves a
/// non-terminal intent behind instead of a silently lost charge
/// ([`Self::pending_intents`] surfaces them).
pub struct CheckoutPipeline<S, P>
where
    S: DocumentStore + Clone,
    P: PaymentGateway,
{
    store: S,
    carts: CartService<S>,
    catalog: CatalogService<S>,
    orders: OrderService<S>,
    gateway: P,
    config: CheckoutConfig,
}

impl<S, P> CheckoutPipeline<S, P>
where
    S: DocumentStore + Clone,
    P: PaymentGateway,
{
    /// Creates a new checkout pipeline.
    pub fn new(store: S, gateway: P, config: CheckoutConfig) -> Self {
        let carts = CartService::new(store.clone());
        let catalog = CatalogService::new(store.clone());
        let orders = OrderService::new(store.clone());
        Self {
            store,
            carts,
            catalog,
            orders,
            gateway,
            config,
        }
    }

    /// Returns the cart service sharing this pipeline's store.
    pub fn carts(&self) -> &CartService<S> {
        &self.carts
    }

    /// Returns the catalog service sharing this pipeline's store.
    pub fn catalog(&self) -> &CatalogService<S> {
        &self.catalog
    }

    /// Returns the order service sharing this pipeline's store.
    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    /// Converts the user's cart into a persisted order.
    ///
    /// Fails with `EmptyCart` for a cart with no lines and `PaymentFailed`
    /// when the gateway declines; both leave the cart and catalog
    /// untouched. After a successful charge the order is persisted, stock
    /// is decremented best-effort per line (floored at zero, failures
    /// logged but never rolled back) and the cart is emptied.
    #[tracing::instrument(skip(self, payment_token), fields(%user_id, %payment_method))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
        shipping_address: ShippingAddress,
        payment_token: Option<String>,
    ) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        // 1. Validate input and load the cart. Nothing is persisted yet,
        //    so every failure in this phase is side-effect free.
        shipping_address.validate()?;

        let token = match (payment_method.is_cash_on_delivery(), payment_token) {
            (true, _) => None,
            (false, Some(token)) => Some(token),
            (false, None) => {
                return Err(DomainError::InvalidInput(
                    "payment token is required".to_string(),
                ));
            }
        };

        let cart = self.carts.get_or_create(user_id).await?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        // 2. Snapshot cart lines against the current catalog.
        let mut lines = Vec::with_capacity(cart.lines.len());
        for cart_line in &cart.lines {
            let product = self.catalog.find_by_id(&cart_line.product_id).await?;
            lines.push(OrderLine {
                product_id: cart_line.product_id.clone(),
                name: product.name.clone(),
                image: product.first_image().map(str::to_string),
                unit_price: cart_line.unit_price,
                quantity: cart_line.quantity,
            });
        }

        // 3. Totals.
        let totals = OrderTotals::compute(&lines, &self.config);

        // 4. Provisional intent, persisted before any charge.
        let order_id = OrderId::new();
        let mut intent = CheckoutIntent::new(order_id, user_id, totals.total_price);
        let mut intent_revision = self.put_intent(&intent, PutOptions::expect_new()).await?;

        // 5. Payment.
        let (payment_result, status, paid_at) = if payment_method.is_cash_on_delivery() {
            (None, OrderStatus::Pending, None)
        } else {
            let token = token.as_deref().unwrap_or_default();
            let mut metadata = HashMap::new();
            metadata.insert("order_id".to_string(), order_id.to_string());
            metadata.insert("user_id".to_string(), user_id.to_string());

            match self
                .gateway
                .charge(totals.total_price, &self.config.currency, token, metadata)
                .await
            {
                Ok(confirmation) => {
                    intent.advance(IntentState::Charged);
                    intent_revision = self
                        .put_intent(&intent, PutOptions::expect_revision(intent_revision))
                        .await?;
                    (
                        Some(serde_json::to_value(&confirmation)?),
                        OrderStatus::Paid,
                        Some(Utc::now()),
                    )
                }
                Err(e) => {
                    intent.advance(IntentState::Failed);
                    self.put_intent(&intent, PutOptions::expect_revision(intent_revision))
                        .await?;
                    metrics::counter!("checkout_payment_failures_total").increment(1);
                    tracing::warn!(%order_id, error = %e, "gateway declined checkout");
                    return Err(DomainError::PaymentFailed(e.to_string()));
                }
            }
        };

        // 6. Persist the order.
        let order = Order {
            id: order_id,
            user_id,
            lines,
            shipping_address,
            payment_method,
            payment_result,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total_price: totals.total_price,
            status,
            paid_at,
            delivered_at: None,
            created_at: Utc::now(),
        };
        self.orders.insert(&order).await?;

        // 7. Best-effort stock decrement. The customer has already been
        //    charged, so a failing line is logged and skipped, never
        //    rolled back.
        for line in &order.lines {
            if let Err(e) = self
                .catalog
                .adjust_stock(&line.product_id, -i64::from(line.quantity))
                .await
            {
                metrics::counter!("checkout_stock_adjust_failures_total").increment(1);
                tracing::warn!(
                    %order_id,
                    product_id = %line.product_id,
                    error = %e,
                    "stock decrement failed after checkout"
                );
            }
        }

        // 8. Empty the cart and close the intent.
        self.carts.clear(user_id).await?;
        intent.advance(IntentState::Completed);
        self.put_intent(&intent, PutOptions::expect_revision(intent_revision))
            .await?;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(%order_id, total = %order.total_price, "checkout completed");

        Ok(order)
    }

    /// Returns intents that never reached a terminal state, oldest first.
    ///
    /// These mark checkouts interrupted between charge and completion and
    /// are the input to out-of-band reconciliation.
    pub async fn pending_intents(&self) -> Result<Vec<CheckoutIntent>> {
        let docs = self.store.list(CHECKOUT_INTENTS).await?;
        let mut intents = docs
            .iter()
            .map(|doc| doc.decode::<CheckoutIntent>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        intents.retain(|intent| !intent.state.is_terminal());
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(intents)
    }

    async fn put_intent(&self, intent: &CheckoutIntent, options: PutOptions) -> Result<Revision> {
        Ok(self
            .store
            .put_as(
                CHECKOUT_INTENTS,
                &intent.order_id.to_string(),
                intent,
                options,
            )
            .await?)
    }
}
