use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{
        ConfirmationEvent,
        ConfirmationSource,
        NewConfirmationLogEntry,
        NotificationStatus,
        NotificationType,
        Order,
        OrderId,
        PaymentMethod,
    },
    order_objects::ConfirmationResult,
    traits::{NotificationDispatcher, PaymentPipelineDatabase, PaymentPipelineError},
};

/// The lookback used to suppress duplicate confirmation notifications for the same order.
pub const DEDUP_WINDOW_SECONDS: i64 = 300;

/// `PaymentConfirmationApi` is the single entry point for confirming an order's payment.
///
/// Three callers fan in here: manual staff confirmation, the gateway webhook, and the
/// client-side status poller. The `source` tag they pass exists purely for the audit trail;
/// the handling is identical.
///
/// The guarantee is best-effort exactly-once *for the customer message*: the dedup window
/// suppresses a repeat notification, never the confirmation itself. The atomic update always
/// runs and is idempotent (`payment_confirmed_at` is stamped at most once), so duplicate
/// callers — and a confirmation arriving while the intake message is still fresh — resolve to
/// harmless re-applications of the same state.
pub struct PaymentConfirmationApi<B, N> {
    db: B,
    dispatcher: N,
}

impl<B, N> Debug for PaymentConfirmationApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentConfirmationApi")
    }
}

impl<B, N> PaymentConfirmationApi<B, N> {
    pub fn new(db: B, dispatcher: N) -> Self {
        Self { db, dispatcher }
    }
}

impl<B, N> PaymentConfirmationApi<B, N>
where
    B: PaymentPipelineDatabase,
    N: NotificationDispatcher,
{
    /// Confirms the payment for `order_id`.
    ///
    /// The steps run strictly in sequence:
    /// 1. dedup check over recently sent notifications (fail-open: a failing read logs a
    ///    warning and proceeds — an observability-store outage must never block a legitimate
    ///    payment). The outcome only decides whether the customer is messaged;
    /// 2. the atomic confirmation update, always — its failure aborts the whole operation, no
    ///    partial state is acceptable at the payment-confirmed boundary;
    /// 3. best-effort customer notification, unless suppressed in step 1 — its failure is
    ///    logged and recorded but never changes the outcome;
    /// 4. an audit entry, always, including on the failure paths.
    pub async fn confirm_payment(
        &self,
        order_id: &OrderId,
        source: ConfirmationSource,
        payment_method: Option<PaymentMethod>,
        gateway_payment_id: Option<String>,
    ) -> Result<ConfirmationResult, PaymentPipelineError> {
        if order_id.as_str().trim().is_empty() {
            let e = PaymentPipelineError::InvalidInput("order id is required".to_string());
            self.audit(
                order_id,
                ConfirmationEvent::PaymentConfirmationFailed,
                source,
                payment_method,
                gateway_payment_id,
                false,
                Some(e.to_string()),
            )
            .await;
            return Err(e);
        }
        trace!("✅️ Payment confirmation for {order_id} triggered via {source}");

        let suppress_notification = self.recently_notified(order_id).await;

        let order = match self.db.confirm_order_payment(order_id, payment_method, gateway_payment_id.as_deref()).await
        {
            Ok(order) => order,
            Err(e) => {
                warn!("✅️ Payment confirmation for {order_id} via {source} failed: {e}");
                self.audit(
                    order_id,
                    ConfirmationEvent::PaymentConfirmationFailed,
                    source,
                    payment_method,
                    gateway_payment_id,
                    false,
                    Some(e.to_string()),
                )
                .await;
                return Err(e);
            },
        };
        debug!("✅️ Order {order_id} is now {} / payment {}", order.status, order.payment_status);

        if suppress_notification {
            info!("✅️ Order {order_id} was messaged within the dedup window; {source} confirmation applied, notification suppressed");
            self.audit(
                order_id,
                ConfirmationEvent::DuplicateConfirmationAttempt,
                source,
                order.payment_method,
                order.gateway_payment_id.clone(),
                false,
                None,
            )
            .await;
            return Ok(ConfirmationResult { order, notification_sent: false, deduplicated: true });
        }

        let (notification_sent, dispatch_error) = self.dispatch_confirmation_message(&order, source).await;
        self.audit(
            order_id,
            ConfirmationEvent::PaymentConfirmed,
            source,
            order.payment_method,
            order.gateway_payment_id.clone(),
            notification_sent,
            dispatch_error,
        )
        .await;
        info!("✅️ Payment for order {order_id} confirmed via {source} (notification sent: {notification_sent})");
        Ok(ConfirmationResult { order, notification_sent, deduplicated: false })
    }

    /// The fail-open dedup check. Any read error is treated as "not notified".
    async fn recently_notified(&self, order_id: &OrderId) -> bool {
        match self
            .db
            .fetch_recent_confirmation_notifications(order_id, Duration::seconds(DEDUP_WINDOW_SECONDS))
            .await
        {
            Ok(records) => !records.is_empty(),
            Err(e) => {
                warn!("✅️ Dedup check for {order_id} failed ({e}); proceeding with confirmation");
                false
            },
        }
    }

    /// Sends the `payment_confirmed` message and records the dispatch outcome. Returns whether
    /// the message went out, plus the error text if it did not.
    async fn dispatch_confirmation_message(
        &self,
        order: &Order,
        source: ConfirmationSource,
    ) -> (bool, Option<String>) {
        if order.customer_phone.is_none() {
            debug!("✅️ Order {} has no phone number; notification skipped", order.order_id);
            self.audit(
                &order.order_id,
                ConfirmationEvent::NotificationSkipped,
                source,
                order.payment_method,
                order.gateway_payment_id.clone(),
                false,
                None,
            )
            .await;
            return (false, None);
        }
        match self.dispatcher.notify(NotificationType::PaymentConfirmed, order).await {
            Ok(()) => {
                self.record_dispatch(&order.order_id, NotificationStatus::Sent).await;
                (true, None)
            },
            Err(e) => {
                error!("✅️ Could not notify customer for order {}: {e}", order.order_id);
                self.record_dispatch(&order.order_id, NotificationStatus::Failed).await;
                (false, Some(e.to_string()))
            },
        }
    }

    async fn record_dispatch(&self, order_id: &OrderId, status: NotificationStatus) {
        if let Err(e) = self.db.record_notification(order_id, NotificationType::PaymentConfirmed, status).await {
            warn!("✅️ Could not record notification outcome for {order_id}: {e}");
        }
    }

    /// Audit entries are observability, never control flow: insert failures are logged and
    /// swallowed.
    #[allow(clippy::too_many_arguments)]
    async fn audit(
        &self,
        order_id: &OrderId,
        event: ConfirmationEvent,
        source: ConfirmationSource,
        payment_method: Option<PaymentMethod>,
        gateway_payment_id: Option<String>,
        notification_sent: bool,
        error: Option<String>,
    ) {
        let entry = NewConfirmationLogEntry {
            order_id: order_id.clone(),
            event,
            source,
            payment_method,
            gateway_payment_id,
            notification_sent,
            error,
        };
        if let Err(e) = self.db.insert_confirmation_log(entry).await {
            warn!("✅️ Could not write confirmation audit entry for {order_id}: {e}");
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
