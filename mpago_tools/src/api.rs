use std::sync::Arc;

use balcao_common::Money;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::MpagoConfig,
    data_objects::{Payer, PaymentState, PixPayment},
    retry::RetryPolicy,
    MpagoApiError,
};

#[derive(Clone)]
pub struct MpagoApi {
    config: MpagoConfig,
    client: Arc<Client>,
    retry: RetryPolicy,
}

impl MpagoApi {
    pub fn new(config: MpagoConfig) -> Result<Self, MpagoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| MpagoApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MpagoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), retry: RetryPolicy::default() })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, MpagoApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MpagoApiError::NetworkError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MpagoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MpagoApiError::NetworkError(e.to_string()))?;
            Err(MpagoApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Creates a PIX payment for the given order and amount. The returned artifact carries the
    /// copy-paste code and its expiry.
    pub async fn create_pix_payment(
        &self,
        order_id: &str,
        amount: Money,
        payer: &Payer,
    ) -> Result<PixPayment, MpagoApiError> {
        #[allow(clippy::cast_precision_loss)]
        let body = serde_json::json!({
            "external_reference": order_id,
            "transaction_amount": amount.value() as f64 / 100.0,
            "payment_method_id": "pix",
            "payer": payer,
        });
        debug!("💳️ Creating PIX payment of {amount} for order {order_id}");
        let payment = self
            .retry
            .execute("create_pix_payment", || {
                self.rest_query::<PixPayment, Value>(Method::POST, "/v1/payments", Some(body.clone()))
            })
            .await?;
        info!("💳️ PIX payment {} created for order {order_id} (expires {})", payment.id, payment.expires_at);
        Ok(payment)
    }

    /// The gateway's current view of the given payment.
    pub async fn payment_status(&self, payment_id: &str) -> Result<PaymentState, MpagoApiError> {
        #[derive(Deserialize)]
        struct StatusResponse {
            status: PaymentState,
        }
        let path = format!("/v1/payments/{payment_id}");
        let result = self
            .retry
            .execute("payment_status", || self.rest_query::<StatusResponse, ()>(Method::GET, &path, None))
            .await?;
        trace!("💳️ Payment {payment_id} is {}", result.status);
        Ok(result.status)
    }
}
