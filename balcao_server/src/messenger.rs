use std::sync::Arc;

use balcao_engine::{
    db_types::{NotificationType, Order},
    traits::{NotificationDispatcher, NotificationError},
};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::config::MessengerConfig;

/// Sends customer text messages through a WhatsApp-gateway-style service.
#[derive(Clone)]
pub struct Messenger {
    config: MessengerConfig,
    client: Arc<Client>,
}

impl Messenger {
    pub fn new(config: MessengerConfig) -> Result<Self, NotificationError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal())
            .map_err(|e| NotificationError::Configuration(e.to_string()))?;
        headers.insert("apikey", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| NotificationError::Configuration(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

fn render_message(event: NotificationType, order: &Order) -> String {
    let n = order.order_number;
    match event {
        NotificationType::OrderCreated => {
            format!("Olá, {}! Recebemos seu pedido #{n} (total {}).", order.customer_name, order.total_amount)
        },
        NotificationType::PaymentConfirmed => {
            format!("Pagamento confirmado! Seu pedido #{n} já está em preparo.")
        },
        NotificationType::OrderReady => format!("Seu pedido #{n} está pronto para retirada!"),
    }
}

impl NotificationDispatcher for Messenger {
    async fn notify(&self, event: NotificationType, order: &Order) -> Result<(), NotificationError> {
        let number = order
            .customer_phone
            .clone()
            .ok_or_else(|| NotificationError::Configuration("order has no phone number".to_string()))?;
        let text = render_message(event, order);
        let url = format!("{}/message/send-text", self.config.base_url);
        trace!("📨️ Sending {event} message for order {} to {url}", order.order_id);
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "number": number, "text": text }))
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed { event: event.to_string(), message: e.to_string() })?;
        if response.status().is_success() {
            debug!("📨️ {event} message for order {} delivered", order.order_id);
            Ok(())
        } else {
            Err(NotificationError::DeliveryFailed {
                event: event.to_string(),
                message: format!("messaging service answered HTTP {}", response.status()),
            })
        }
    }
}
