use chrono::Duration;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NotificationRecord, NotificationStatus, NotificationType, OrderId},
    traits::PaymentPipelineError,
};

/// Records the outcome of a single dispatch attempt. `sent_at` is stamped only when the
/// record is marked `sent`.
pub async fn record_notification(
    order_id: &OrderId,
    event: NotificationType,
    status: NotificationStatus,
    conn: &mut SqliteConnection,
) -> Result<NotificationRecord, PaymentPipelineError> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO notifications (order_id, event, status, sent_at)
            VALUES ($1, $2, $3, CASE WHEN $3 = 'sent' THEN CURRENT_TIMESTAMP ELSE NULL END)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(event)
    .bind(status)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

/// The dedup lookback: confirmation-related notifications marked `sent` for this order within
/// the last `window`.
pub async fn fetch_recent_confirmation_notifications(
    order_id: &OrderId,
    window: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<NotificationRecord>, PaymentPipelineError> {
    let records: Vec<NotificationRecord> = sqlx::query_as(
        format!(
            "SELECT * FROM notifications
             WHERE order_id = $1
               AND status = 'sent'
               AND event IN ('payment_confirmed', 'order_created')
               AND sent_at >= datetime(CURRENT_TIMESTAMP, '-{} seconds')",
            window.num_seconds()
        )
        .as_str(),
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    trace!("📝️ {} recent confirmation notifications for {order_id}", records.len());
    Ok(records)
}
