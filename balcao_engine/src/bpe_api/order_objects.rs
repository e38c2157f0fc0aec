use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// A caller's reference to a catalog item plus quantity; resolved against the catalog (and
/// priced) by the pipeline at handling time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSelection {
    pub menu_item_id: i64,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The outcome of a payment confirmation attempt that did not abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub order: Order,
    /// False when the customer has no phone number, when dispatch failed, or when the attempt
    /// was deduplicated. Never turns a confirmed payment into a failure.
    pub notification_sent: bool,
    /// True when the dedup window muted the notification. The confirmation itself is still
    /// applied (idempotently).
    pub deduplicated: bool,
}
