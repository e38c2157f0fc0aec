use balcao_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem};

/// The result of a mid-flight item addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendedOrder {
    /// The order row as it stands after the amendment, totals recomputed.
    pub order: Order,
    pub added_items: Vec<OrderItem>,
    pub added_amount: Money,
    /// True when an outstanding, unexpired instant-payment code was cleared by this
    /// amendment. The caller must start a fresh payment cycle.
    pub pix_invalidated: bool,
}
