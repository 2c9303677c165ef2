use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::config::PaymentConfig;
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Client for an order-based payment gateway (Razorpay-compatible API).
pub struct PaymentGateway {
    client: reqwest::Client,
    config: PaymentConfig,
    key: hmac::Key,
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> PaymentGateway {
        let key = hmac::Key::new(hmac::HMAC_SHA256, config.key_secret.as_bytes());
        PaymentGateway {
            client: reqwest::Client::new(),
            config,
            key,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, Error> {
        let url = format!("{}/orders", self.config.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderRequest {
                amount,
                currency,
                receipt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::UpstreamRejected {
                service: "payment",
                status: response.status().as_u16(),
            });
        }

        let order: GatewayOrder = response.json().await?;

        Ok(order)
    }

    /// Checks `signature` against HMAC-SHA256 of `"{order_id}|{payment_id}"`.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let signature = match hex::decode(signature.trim()) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        let message = format!("{}|{}", order_id, payment_id);

        hmac::verify(&self.key, message.as_bytes(), &signature).is_ok()
    }
}

#[cfg(test)]
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(tag.as_ref())
}

#[cfg(test)]
pub fn test_gateway(secret: &str) -> PaymentGateway {
    PaymentGateway::new(PaymentConfig {
        api_url: "http://127.0.0.1:9".into(),
        key_id: "rzp_test_key".into(),
        key_secret: secret.into(),
    })
}
