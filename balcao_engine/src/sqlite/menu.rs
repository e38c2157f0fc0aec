use balcao_common::Money;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{db_types::MenuItem, traits::PaymentPipelineError};

/// Fetches the catalog rows with the given ids. Ids that do not exist are simply absent from
/// the result.
pub async fn fetch_menu_items(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<MenuItem>, PaymentPipelineError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT id, name, price, available FROM menu_items WHERE id IN (");
    let mut in_list = builder.separated(", ");
    for id in ids {
        in_list.push_bind(id);
    }
    builder.push(")");
    trace!("📝️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<MenuItem>().fetch_all(conn).await?;
    Ok(items)
}

pub async fn insert_menu_item(
    name: &str,
    price: Money,
    available: bool,
    conn: &mut SqliteConnection,
) -> Result<MenuItem, PaymentPipelineError> {
    let item = sqlx::query_as(
        "INSERT INTO menu_items (name, price, available) VALUES ($1, $2, $3) RETURNING id, name, price, available",
    )
    .bind(name)
    .bind(price)
    .bind(available)
    .fetch_one(conn)
    .await?;
    Ok(item)
}
