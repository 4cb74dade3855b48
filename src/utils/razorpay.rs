use serde::{Deserialize, Serialize};
use reqwest::Client;
use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};

use crate::config::Config;

/// Order handle returned by the provider; the client opens checkout with `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Creates payment orders. Built once at startup and shared by handle.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> Result<ProviderOrder>;
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Clone)]
pub struct RazorpayClient {
    http: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(base_url: &str, key_id: &str, key_secret: &str) -> Self {
        RazorpayClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.razorpay_api_base, &config.razorpay_key_id, &config.razorpay_key_secret)
    }

    fn auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.key_id, self.key_secret);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> Result<ProviderOrder> {
        let url = format!("{}/orders", self.base_url);
        let payload = CreateOrderRequest { amount, currency, receipt };

        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            let order: ProviderOrder = response.json().await?;
            Ok(order)
        } else {
            let status = response.status();
            let err_text = response.text().await?;
            Err(anyhow::anyhow!("Razorpay API error ({status}): {err_text}"))
        }
    }
}

/// Webhook delivery envelope. Only the payment entity is read.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<WebhookEntity<PaymentEntity>>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntity<T> {
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl WebhookEvent {
    /// `(order_id, payment_id)` when the delivery carries a payment tied to an order.
    pub fn payment_ref(&self) -> Option<(&str, &str)> {
        let payment = &self.payload.payment.as_ref()?.entity;
        Some((payment.order_id.as_deref()?, payment.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_header_is_basic_key_pair() {
        let client = RazorpayClient::new("https://api.razorpay.com/v1/", "rzp_test_id", "secret");
        assert_eq!(client.base_url, "https://api.razorpay.com/v1");
        assert_eq!(client.auth_header(), "Basic cnpwX3Rlc3RfaWQ6c2VjcmV0");
    }

    #[test]
    fn webhook_payment_reference() {
        let body = r#"{
            "entity": "event",
            "event": "payment.failed",
            "payload": { "payment": { "entity": { "id": "pay_29QQoUBi66xm2f", "order_id": "order_9A33XWu170gUtm", "status": "failed" } } }
        }"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(event.event, "payment.failed");
        assert_eq!(event.payment_ref(), Some(("order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f")));
    }

    #[test]
    fn webhook_without_payment() {
        let event: WebhookEvent = serde_json::from_str(r#"{"event":"refund.created"}"#).unwrap();
        assert!(event.payment_ref().is_none());
    }
}
