use std::fmt::Debug;

use log::*;

use crate::{
    bpe_api::resolve_item_selections,
    db_types::{OrderId, OrderStatusType},
    order_objects::ItemSelection,
    traits::{AmendedOrder, PaymentPipelineDatabase, PaymentPipelineError},
};

/// `OrderAmendmentApi` handles mid-flight item additions: a waiter adding items to an order
/// the kitchen is already preparing.
///
/// Amending an order changes its total, so the commission is recomputed and any outstanding
/// unexpired instant-payment code is invalidated; the caller is told to start a fresh payment
/// cycle via [`AmendedOrder::pix_invalidated`].
pub struct OrderAmendmentApi<B> {
    db: B,
}

impl<B> Debug for OrderAmendmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderAmendmentApi")
    }
}

impl<B> OrderAmendmentApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderAmendmentApi<B>
where B: PaymentPipelineDatabase
{
    /// Adds items to an in-preparation order on behalf of `waiter_id`.
    ///
    /// Preconditions, checked in order, each with its own error: a non-empty item list; a
    /// waiter id; an existing order; the order belongs to this waiter; the order is
    /// `in_preparation`; every referenced menu item exists and is available. The insert and
    /// the totals update run in one transaction.
    pub async fn add_items(
        &self,
        order_id: &OrderId,
        items: &[ItemSelection],
        waiter_id: &str,
    ) -> Result<AmendedOrder, PaymentPipelineError> {
        if order_id.as_str().trim().is_empty() || items.is_empty() {
            return Err(PaymentPipelineError::InvalidInput(
                "order id and at least one item are required".to_string(),
            ));
        }
        if waiter_id.trim().is_empty() {
            return Err(PaymentPipelineError::InvalidInput("waiter id is required".to_string()));
        }
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| PaymentPipelineError::OrderNotFound(order_id.clone()))?;
        match order.waiter_id.as_deref() {
            Some(w) if w == waiter_id => {},
            _ => {
                debug!("➕️ Waiter {waiter_id} may not amend order {order_id}");
                return Err(PaymentPipelineError::PermissionDenied(format!(
                    "Order {order_id} does not belong to waiter {waiter_id}"
                )));
            },
        }
        if order.status != OrderStatusType::InPreparation {
            return Err(PaymentPipelineError::AmendmentNotAllowed { order_id: order_id.clone(), status: order.status });
        }
        let priced = resolve_item_selections(&self.db, items).await?;
        let result = self.db.add_items_to_order(order_id, &priced).await?;
        info!(
            "➕️ Waiter {waiter_id} added {} items ({}) to order {order_id}; new total {}{}",
            result.added_items.len(),
            result.added_amount,
            result.order.total_amount,
            if result.pix_invalidated { "; outstanding PIX code invalidated" } else { "" }
        );
        Ok(result)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
