use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrderItem, OrderId, OrderItem},
    traits::PaymentPipelineError,
};

/// Inserts the given priced line items for an order. Line items are append-only; there is no
/// update or delete path. Embed in a transaction by passing `&mut *tx`.
pub async fn insert_items(
    order_id: &OrderId,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, PaymentPipelineError> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, menu_item_id, name, unit_price, quantity, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *;
            "#,
        )
        .bind(order_id.as_str())
        .bind(item.menu_item_id)
        .bind(&item.name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(&item.notes)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

/// All line items of an order, oldest first.
pub async fn fetch_items_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}
