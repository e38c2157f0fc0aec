//! Support code for the integration test suites. Not part of the public pipeline API.

use crate::{db_types::MenuItem, PaymentPipelineDatabase, SqliteDatabase};

/// A fresh, fully migrated in-memory database. The pool is capped at a single connection so
/// every query sees the same in-memory instance.
pub async fn new_test_db() -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

/// Seeds a small menu: a burger at R$12.75, a juice at R$10.00, and an unavailable special.
/// Returns the rows in that order.
pub async fn seed_menu(db: &SqliteDatabase) -> Vec<MenuItem> {
    let mut items = Vec::new();
    for (name, cents, available) in
        [("X-Burger", 1275, true), ("Suco de Laranja", 1000, true), ("Feijoada do Dia", 2590, false)]
    {
        let item = db
            .insert_menu_item(name, balcao_common::Money::from_cents(cents), available)
            .await
            .expect("Error seeding menu item");
        items.push(item);
    }
    items
}
