use balcao_common::Money;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentMethod, PixArtifact},
    traits::PaymentPipelineError,
};

/// Returns the next sequential human-facing order number.
pub async fn next_order_number(conn: &mut SqliteConnection) -> Result<i64, PaymentPipelineError> {
    let (number,): (i64,) =
        sqlx::query_as("SELECT COALESCE(MAX(order_number), 0) + 1 FROM orders").fetch_one(conn).await?;
    Ok(number)
}

/// Inserts a new order row. Not atomic on its own; embed in a transaction together with the
/// item inserts by passing `&mut *tx` as the connection.
pub async fn insert_order(
    order: &NewOrder,
    order_number: i64,
    status: OrderStatusType,
    total: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentPipelineError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                order_number,
                customer_name,
                customer_phone,
                waiter_id,
                staff_assisted,
                status,
                total_amount,
                commission_amount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.waiter_id)
    .bind(order.staff_assisted)
    .bind(status)
    .bind(total)
    .bind(total.commission())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted with number {}", order.order_id, order.order_number);
    Ok(order)
}

/// Returns the order with the given id, excluding soft-deleted rows.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1 AND deleted_at IS NULL")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// The atomic payment-confirmation update. Leaves `status` untouched when the order has
/// already progressed past the payment gate, stamps `payment_confirmed_at` at most once, and
/// consumes any outstanding instant-payment code. Returns `None` if no confirmable row
/// matched (missing id or terminal status).
pub async fn confirm_payment(
    order_id: &OrderId,
    method: Option<PaymentMethod>,
    gateway_payment_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentPipelineError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = CASE
                    WHEN status IN ('pending', 'pending_payment') THEN 'in_preparation'
                    ELSE status
                END,
                payment_status = 'confirmed',
                payment_confirmed_at = COALESCE(payment_confirmed_at, CURRENT_TIMESTAMP),
                payment_method = COALESCE($2, payment_method),
                gateway_payment_id = COALESCE($3, gateway_payment_id),
                pix_code = NULL,
                pix_generated_at = NULL,
                pix_expires_at = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1
              AND deleted_at IS NULL
              AND status NOT IN ('completed', 'cancelled')
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(method)
    .bind(gateway_payment_id)
    .fetch_optional(conn)
    .await?;
    trace!("📝️ Result of confirm_payment for {order_id}: {order:?}");
    Ok(order)
}

/// Sets the order status and stamps the timestamp column that belongs to the new status.
pub async fn update_order_status(
    order_id: &OrderId,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentPipelineError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $2,
                ready_at = CASE WHEN $2 = 'ready' THEN CURRENT_TIMESTAMP ELSE ready_at END,
                completed_at = CASE WHEN $2 = 'completed' THEN CURRENT_TIMESTAMP ELSE completed_at END,
                cancelled_at = CASE WHEN $2 = 'cancelled' THEN CURRENT_TIMESTAMP ELSE cancelled_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(new_status)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| PaymentPipelineError::OrderNotFound(order_id.clone()))
}

/// Replaces the totals on the order row, recomputing nothing from stale caller state: the
/// caller must derive `new_total` from the row as read inside the same transaction. Clears
/// the instant-payment artifact fields when `clear_pix` is set.
pub async fn update_totals(
    order_id: &OrderId,
    new_total: Money,
    clear_pix: bool,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentPipelineError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                total_amount = $2,
                commission_amount = $3,
                pix_code = CASE WHEN $4 THEN NULL ELSE pix_code END,
                pix_generated_at = CASE WHEN $4 THEN NULL ELSE pix_generated_at END,
                pix_expires_at = CASE WHEN $4 THEN NULL ELSE pix_expires_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(new_total)
    .bind(new_total.commission())
    .bind(clear_pix)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| PaymentPipelineError::OrderNotFound(order_id.clone()))
}

/// Attaches a fresh instant-payment artifact. Only orders whose payment is still pending and
/// that are not terminal qualify; returns `None` otherwise.
pub async fn attach_pix_artifact(
    order_id: &OrderId,
    artifact: &PixArtifact,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentPipelineError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                pix_code = $2,
                pix_generated_at = $3,
                pix_expires_at = $4,
                gateway_payment_id = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1
              AND deleted_at IS NULL
              AND payment_status = 'pending'
              AND status NOT IN ('completed', 'cancelled')
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(&artifact.code)
    .bind(artifact.generated_at)
    .bind(artifact.expires_at)
    .bind(&artifact.gateway_payment_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
