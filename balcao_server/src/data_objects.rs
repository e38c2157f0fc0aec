use std::fmt::Display;

use balcao_common::Money;
use balcao_engine::{
    db_types::{Order, OrderItem, OrderStatusType, PaymentMethod},
    order_objects::ItemSelection,
    traits::AmendedOrder,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// `POST /orders` body. When no order id is supplied the server generates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_id: Option<String>,
    pub items: Vec<ItemSelection>,
}

/// `POST /orders/{id}/items` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemsRequest {
    pub items: Vec<ItemSelection>,
    pub waiter_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemsResponse {
    pub success: bool,
    pub order: Order,
    pub added_items: Vec<OrderItem>,
    pub added_amount: Money,
    pub new_total: Money,
    pub pix_invalidated: bool,
}

impl From<AmendedOrder> for AddItemsResponse {
    fn from(amended: AmendedOrder) -> Self {
        Self {
            success: true,
            new_total: amended.order.total_amount,
            order: amended.order,
            added_items: amended.added_items,
            added_amount: amended.added_amount,
            pix_invalidated: amended.pix_invalidated,
        }
    }
}

/// `POST /orders/{id}/payment` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub payer_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub order: Order,
    pub pix_code: String,
    pub expires_at: DateTime<Utc>,
}

/// `POST /orders/{id}/confirm` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualConfirmRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// `POST /orders/{id}/status` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatusType,
}

/// The gateway's webhook payload. Only used as a hint for which payment to re-query; the
/// status inside (if any) is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookPayload {
    #[serde(default)]
    pub action: Option<String>,
    pub data: WebhookData,
    /// The order the payment was created for.
    pub external_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub id: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn webhook_payload_deserializes() {
        let json = r#"{
            "action": "payment.updated",
            "data": { "id": "mp-12345" },
            "external_reference": "ord-abc"
        }"#;
        let payload = serde_json::from_str::<PaymentWebhookPayload>(json).unwrap();
        assert_eq!(payload.action.as_deref(), Some("payment.updated"));
        assert_eq!(payload.data.id, "mp-12345");
        assert_eq!(payload.external_reference, "ord-abc");
    }

    #[test]
    fn add_items_request_deserializes() {
        let json = r#"{
            "waiter_id": "w-1",
            "items": [{ "menu_item_id": 2, "quantity": 1, "notes": "sem gelo" }]
        }"#;
        let req = serde_json::from_str::<AddItemsRequest>(json).unwrap();
        assert_eq!(req.waiter_id, "w-1");
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].menu_item_id, 2);
        assert_eq!(req.items[0].notes.as_deref(), Some("sem gelo"));
    }

    #[test]
    fn status_change_request_uses_snake_case() {
        let req = serde_json::from_str::<StatusChangeRequest>(r#"{ "status": "in_preparation" }"#).unwrap();
        assert_eq!(req.status, OrderStatusType::InPreparation);
        assert!(serde_json::from_str::<StatusChangeRequest>(r#"{ "status": "InPreparation" }"#).is_err());
    }
}
