use sqlx::SqliteConnection;

use crate::{
    db_types::{ConfirmationLogEntry, NewConfirmationLogEntry, OrderId},
    traits::PaymentPipelineError,
};

pub async fn insert_entry(
    entry: NewConfirmationLogEntry,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentPipelineError> {
    sqlx::query(
        r#"
            INSERT INTO confirmation_log
                (order_id, event, source, payment_method, gateway_payment_id, notification_sent, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(entry.order_id.as_str())
    .bind(entry.event)
    .bind(entry.source)
    .bind(entry.payment_method)
    .bind(entry.gateway_payment_id)
    .bind(entry.notification_sent)
    .bind(entry.error)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_entries_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<ConfirmationLogEntry>, PaymentPipelineError> {
    let entries = sqlx::query_as("SELECT * FROM confirmation_log WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
