use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    bpe_api::resolve_item_selections,
    db_types::{NewOrder, NotificationStatus, NotificationType, Order, OrderId, OrderStatusType, PixArtifact},
    order_objects::ItemSelection,
    traits::{NotificationDispatcher, PaymentPipelineDatabase, PaymentPipelineError},
};

/// `OrderFlowApi` handles order intake, kitchen-side status changes, and payment-artifact
/// bookkeeping. Payment confirmation itself lives in
/// [`PaymentConfirmationApi`](crate::PaymentConfirmationApi).
pub struct OrderFlowApi<B, N> {
    db: B,
    dispatcher: N,
}

impl<B, N> Debug for OrderFlowApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, N> OrderFlowApi<B, N> {
    pub fn new(db: B, dispatcher: N) -> Self {
        Self { db, dispatcher }
    }
}

impl<B, N> OrderFlowApi<B, N>
where
    B: PaymentPipelineDatabase,
    N: NotificationDispatcher,
{
    /// Submits a brand-new order with its initial items.
    ///
    /// Customer-initiated orders start in `pending_payment`; staff-assisted orders (those
    /// carrying a waiter id) go straight to `in_preparation` with payment still pending.
    /// Prices are snapshotted from the catalog, totals and commission computed, and an
    /// `order_created` message dispatched best-effort.
    pub async fn process_new_order(
        &self,
        order: NewOrder,
        items: &[ItemSelection],
    ) -> Result<Order, PaymentPipelineError> {
        if items.is_empty() {
            return Err(PaymentPipelineError::InvalidInput("an order needs at least one item".to_string()));
        }
        let priced = resolve_item_selections(&self.db, items).await?;
        let order = self.db.insert_order(order, &priced).await?;
        debug!("📦️ Order {} created with {} items, total {}", order.order_id, priced.len(), order.total_amount);
        self.dispatch(NotificationType::OrderCreated, &order).await;
        Ok(order)
    }

    /// Kitchen-side status change: `ready`, `completed` or `cancelled`.
    ///
    /// The payment-gate transitions (`paid`, `in_preparation` from a pending state) belong to
    /// the confirmation coordinator and are rejected here. The full transition matrix lives in
    /// [`OrderStatusType::can_transition_to`]; an `order_ready` message is dispatched
    /// best-effort when an order becomes ready.
    pub async fn modify_status_for_order(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, PaymentPipelineError> {
        use OrderStatusType::*;
        if !matches!(new_status, Ready | Completed | Cancelled) {
            return Err(PaymentPipelineError::InvalidInput(format!(
                "Status {new_status} cannot be set directly; it is owned by the payment pipeline"
            )));
        }
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| PaymentPipelineError::OrderNotFound(order_id.clone()))?;
        let old_status = order.status;
        if !old_status.can_transition_to(new_status) {
            return Err(PaymentPipelineError::InvalidStatusChange { from: old_status, to: new_status });
        }
        let order = self.db.update_order_status(order_id, new_status).await?;
        info!("📦️ Order {order_id} moved from {old_status} to {new_status}");
        if new_status == Ready {
            self.dispatch(NotificationType::OrderReady, &order).await;
        }
        Ok(order)
    }

    /// Stores a freshly issued instant-payment code against the order.
    ///
    /// The order must still owe its payment, must not be terminal, and must not hold a valid
    /// (unexpired) code — an outstanding code has to be invalidated (by expiry or by an
    /// amendment) before a new payment cycle may start.
    pub async fn attach_pix_artifact(
        &self,
        order_id: &OrderId,
        artifact: PixArtifact,
    ) -> Result<Order, PaymentPipelineError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| PaymentPipelineError::OrderNotFound(order_id.clone()))?;
        if order.has_valid_pix_code(Utc::now()) {
            return Err(PaymentPipelineError::PaymentArtifactOutstanding(order_id.clone()));
        }
        let order = self.db.attach_pix_artifact(order_id, &artifact).await?;
        debug!(
            "📦️ PIX code attached to order {order_id} (gateway ref {}, expires {})",
            artifact.gateway_payment_id, artifact.expires_at
        );
        Ok(order)
    }

    /// Best-effort dispatch; failures are logged and recorded, never propagated. Orders
    /// without a phone number are skipped silently.
    async fn dispatch(&self, event: NotificationType, order: &Order) {
        if order.customer_phone.is_none() {
            debug!("📦️ Order {} has no phone number; {event} notification skipped", order.order_id);
            return;
        }
        let status = match self.dispatcher.notify(event, order).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                error!("📦️ Could not send {event} message for order {}: {e}", order.order_id);
                NotificationStatus::Failed
            },
        };
        if let Err(e) = self.db.record_notification(&order.order_id, event, status).await {
            warn!("📦️ Could not record {event} notification outcome for {}: {e}", order.order_id);
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
