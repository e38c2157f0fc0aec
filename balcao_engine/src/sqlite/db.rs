use std::{fmt::Debug, str::FromStr, time::Duration};

use balcao_common::Money;
use chrono::Utc;
use log::debug;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use super::{confirmation_log, menu, notifications, order_items, orders};
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
    traits::{AmendedOrder, PaymentPipelineDatabase, PaymentPipelineError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a connection pool against the given sqlite URL, creating the database file if
    /// it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentPipelineError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| PaymentPipelineError::DatabaseError(e.to_string()))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), PaymentPipelineError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentPipelineError::DatabaseError(e.to_string()))?;
        debug!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl PaymentPipelineDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, PaymentPipelineError> {
        let mut tx = self.pool.begin().await?;
        let order_number = orders::next_order_number(&mut tx).await?;
        // Staff-assisted orders enter preparation immediately; payment is collected later.
        let status =
            if order.staff_assisted { OrderStatusType::InPreparation } else { OrderStatusType::PendingPayment };
        let total: Money = items.iter().map(NewOrderItem::line_total).sum();
        let order_id = order.order_id.clone();
        let inserted = match orders::insert_order(&order, order_number, status, total, &mut tx).await {
            Ok(o) => o,
            Err(PaymentPipelineError::UniqueViolation(_)) => {
                return Err(PaymentPipelineError::OrderAlreadyExists(order_id));
            },
            Err(e) => return Err(e),
        };
        order_items::insert_items(&order_id, items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} saved as order number {order_number} ({status}, {total})");
        Ok(inserted)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_menu_items(&self, ids: &[i64]) -> Result<Vec<MenuItem>, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        menu::fetch_menu_items(ids, &mut conn).await
    }

    async fn confirm_order_payment(
        &self,
        order_id: &OrderId,
        method: Option<PaymentMethod>,
        gateway_payment_id: Option<&str>,
    ) -> Result<Order, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        match orders::confirm_payment(order_id, method, gateway_payment_id, &mut conn).await? {
            Some(order) => Ok(order),
            // No confirmable row. Distinguish a missing order from a terminal one.
            None => match orders::fetch_order_by_order_id(order_id, &mut conn).await? {
                Some(order) => Err(PaymentPipelineError::InvalidStatusChange {
                    from: order.status,
                    to: OrderStatusType::InPreparation,
                }),
                None => Err(PaymentPipelineError::OrderNotFound(order_id.clone())),
            },
        }
    }

    async fn add_items_to_order(
        &self,
        order_id: &OrderId,
        items: &[NewOrderItem],
    ) -> Result<AmendedOrder, PaymentPipelineError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentPipelineError::OrderNotFound(order_id.clone()))?;
        // Re-checked inside the transaction; the API-level check may have read a stale row.
        if order.status != OrderStatusType::InPreparation {
            return Err(PaymentPipelineError::AmendmentNotAllowed {
                order_id: order_id.clone(),
                status: order.status,
            });
        }
        let added_items = order_items::insert_items(order_id, items, &mut tx).await?;
        let added_amount: Money = items.iter().map(NewOrderItem::line_total).sum();
        let new_total = order.total_amount + added_amount;
        let pix_invalidated = order.has_valid_pix_code(Utc::now());
        // An expired leftover code is cleared as well, but only a still-valid one counts as
        // invalidated towards the caller.
        let clear_pix = order.pix_code.is_some();
        let order = orders::update_totals(order_id, new_total, clear_pix, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_id} amended: {} items, {added_amount} added, new total {new_total}, pix invalidated: \
             {pix_invalidated}",
            added_items.len()
        );
        Ok(AmendedOrder { order, added_items, added_amount, pix_invalidated })
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, new_status, &mut conn).await
    }

    async fn attach_pix_artifact(
        &self,
        order_id: &OrderId,
        artifact: &PixArtifact,
    ) -> Result<Order, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        match orders::attach_pix_artifact(order_id, artifact, &mut conn).await? {
            Some(order) => Ok(order),
            None => match orders::fetch_order_by_order_id(order_id, &mut conn).await? {
                Some(_) => Err(PaymentPipelineError::PaymentNotPending(order_id.clone())),
                None => Err(PaymentPipelineError::OrderNotFound(order_id.clone())),
            },
        }
    }

    async fn fetch_recent_confirmation_notifications(
        &self,
        order_id: &OrderId,
        window: chrono::Duration,
    ) -> Result<Vec<NotificationRecord>, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        notifications::fetch_recent_confirmation_notifications(order_id, window, &mut conn).await
    }

    async fn record_notification(
        &self,
        order_id: &OrderId,
        event: NotificationType,
        status: NotificationStatus,
    ) -> Result<NotificationRecord, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        notifications::record_notification(order_id, event, status, &mut conn).await
    }

    async fn insert_confirmation_log(&self, entry: NewConfirmationLogEntry) -> Result<(), PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        confirmation_log::insert_entry(entry, &mut conn).await
    }

    async fn fetch_confirmation_log(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<ConfirmationLogEntry>, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        confirmation_log::fetch_entries_for_order(order_id, &mut conn).await
    }

    async fn insert_menu_item(
        &self,
        name: &str,
        price: Money,
        available: bool,
    ) -> Result<MenuItem, PaymentPipelineError> {
        let mut conn = self.pool.acquire().await?;
        menu::insert_menu_item(name, price, available, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), PaymentPipelineError> {
        self.pool.close().await;
        Ok(())
    }
}
