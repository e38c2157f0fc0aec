use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{
        ConfirmationLogEntry,
        MenuItem,
        NewConfirmationLogEntry,
        NewOrder,
        NewOrderItem,
        NotificationRecord,
        NotificationStatus,
        NotificationType,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        PaymentMethod,
        PixArtifact,
    },
    traits::AmendedOrder,
};

/// The single logical order store behind the payment and fulfillment pipeline.
///
/// The store offers row-level, last-write-wins update semantics; there is no explicit locking.
/// Every writer recomputes derived fields (commission) from the values it is itself writing.
/// Multi-row effects (order + items) are atomic within one call.
#[allow(async_fn_in_trait)]
pub trait PaymentPipelineDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Stores a new order together with its initial line items in a single atomic
    /// transaction. Assigns the next sequential order number. Prices and names on the items
    /// must already be snapshotted from the catalog. Totals and commission are computed from
    /// the items. Returns an error if the order id already exists.
    async fn insert_order(&self, order: NewOrder, items: &[NewOrderItem])
        -> Result<Order, PaymentPipelineError>;

    /// Fetches an order by its opaque id. Soft-deleted orders are not returned.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentPipelineError>;

    /// All line items of an order, in insertion order.
    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, PaymentPipelineError>;

    /// Catalog lookup for the given item ids. Missing ids are silently absent from the result;
    /// callers decide whether that is an error.
    async fn fetch_menu_items(&self, ids: &[i64]) -> Result<Vec<MenuItem>, PaymentPipelineError>;

    /// Marks the order's payment as confirmed in one atomic update:
    /// `payment_status = confirmed`, `status = in_preparation` (only when the order was still
    /// awaiting payment; later statuses are preserved), `payment_confirmed_at` set once and
    /// never overwritten, payment method and gateway reference recorded, any outstanding
    /// instant-payment code cleared.
    ///
    /// Fails with [`PaymentPipelineError::OrderNotFound`] if the id does not exist and with
    /// [`PaymentPipelineError::InvalidStatusChange`] if the order is in a terminal state.
    /// Re-confirming an already-confirmed, non-terminal order is a harmless no-op update.
    async fn confirm_order_payment(
        &self,
        order_id: &OrderId,
        method: Option<PaymentMethod>,
        gateway_payment_id: Option<&str>,
    ) -> Result<Order, PaymentPipelineError>;

    /// Inserts the given priced items and updates the order's totals in a single transaction.
    ///
    /// The order must be `in_preparation` (re-checked inside the transaction). The new total
    /// is computed from the row as read inside the transaction, never from a caller-supplied
    /// value, and the commission is recomputed from that new total. Any outstanding
    /// instant-payment code is cleared; the result reports whether a still-valid code was
    /// invalidated by this amendment.
    async fn add_items_to_order(
        &self,
        order_id: &OrderId,
        items: &[NewOrderItem],
    ) -> Result<AmendedOrder, PaymentPipelineError>;

    /// Sets the order status and stamps the matching timestamp column (`ready_at`,
    /// `completed_at` or `cancelled_at`). Legality of the transition is the caller's
    /// responsibility; see [`OrderStatusType::can_transition_to`].
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, PaymentPipelineError>;

    /// Attaches a freshly issued instant-payment code to an order whose payment is still
    /// pending, replacing any (expired) previous artifact.
    async fn attach_pix_artifact(&self, order_id: &OrderId, artifact: &PixArtifact)
        -> Result<Order, PaymentPipelineError>;

    /// Notifications of type `payment_confirmed` or `order_created` marked `sent` for this
    /// order within the given lookback window. This is the coordinator's dedup source.
    async fn fetch_recent_confirmation_notifications(
        &self,
        order_id: &OrderId,
        window: Duration,
    ) -> Result<Vec<NotificationRecord>, PaymentPipelineError>;

    /// Records the outcome of a notification dispatch attempt. `sent_at` is stamped when the
    /// status is `sent`.
    async fn record_notification(
        &self,
        order_id: &OrderId,
        event: NotificationType,
        status: NotificationStatus,
    ) -> Result<NotificationRecord, PaymentPipelineError>;

    /// Appends a confirmation audit entry. Never updated afterwards.
    async fn insert_confirmation_log(&self, entry: NewConfirmationLogEntry) -> Result<(), PaymentPipelineError>;

    /// The audit trail for one order, oldest first.
    async fn fetch_confirmation_log(&self, order_id: &OrderId)
        -> Result<Vec<ConfirmationLogEntry>, PaymentPipelineError>;

    /// Creates a catalog row. The catalog is managed elsewhere; this exists for seeding and
    /// tests.
    async fn insert_menu_item(&self, name: &str, price: balcao_common::Money, available: bool)
        -> Result<MenuItem, PaymentPipelineError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentPipelineError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentPipelineError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("A conflicting row already exists: {0}")]
    UniqueViolation(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The menu item {0} does not exist")]
    MenuItemNotFound(i64),
    #[error("The menu item '{0}' is not available")]
    MenuItemUnavailable(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Order {order_id} cannot be amended while it is {status}")]
    AmendmentNotAllowed { order_id: OrderId, status: OrderStatusType },
    #[error("Illegal status change from {from} to {to}")]
    InvalidStatusChange { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} already holds a valid instant-payment code")]
    PaymentArtifactOutstanding(OrderId),
    #[error("Order {0} is not awaiting payment")]
    PaymentNotPending(OrderId),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for PaymentPipelineError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PaymentPipelineError::UniqueViolation(db.to_string())
            },
            _ => PaymentPipelineError::DatabaseError(e.to_string()),
        }
    }
}
