pub mod amendment_api;
pub mod confirmation_api;
pub mod order_flow_api;
pub mod order_objects;

use std::collections::HashMap;

use crate::{
    db_types::NewOrderItem,
    order_objects::ItemSelection,
    traits::{PaymentPipelineDatabase, PaymentPipelineError},
};

/// Resolves item selections against the catalog, snapshotting name and price at this instant.
/// Rejects unknown items, unavailable items (naming the offending item) and non-positive
/// quantities.
pub(crate) async fn resolve_item_selections<B: PaymentPipelineDatabase>(
    db: &B,
    selections: &[ItemSelection],
) -> Result<Vec<NewOrderItem>, PaymentPipelineError> {
    let ids: Vec<i64> = selections.iter().map(|s| s.menu_item_id).collect();
    let menu = db.fetch_menu_items(&ids).await?;
    let by_id: HashMap<i64, _> = menu.into_iter().map(|m| (m.id, m)).collect();
    let mut priced = Vec::with_capacity(selections.len());
    for selection in selections {
        if selection.quantity <= 0 {
            return Err(PaymentPipelineError::InvalidInput(format!(
                "Quantity for menu item {} must be positive",
                selection.menu_item_id
            )));
        }
        let item = by_id
            .get(&selection.menu_item_id)
            .ok_or(PaymentPipelineError::MenuItemNotFound(selection.menu_item_id))?;
        if !item.available {
            return Err(PaymentPipelineError::MenuItemUnavailable(item.name.clone()));
        }
        priced.push(NewOrderItem {
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity: selection.quantity,
            notes: selection.notes.clone(),
        });
    }
    Ok(priced)
}
