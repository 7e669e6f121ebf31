//! Payment gateway client for token requests.
//!
//! The gateway is an opaque collaborator: the engine sends an order ID, an
//! amount in minor units, and a phone number, and gets back a one-time
//! token plus the URL the browser must POST it to. Everything after the
//! redirect (card entry, 3-D Secure, callbacks) belongs to the gateway and
//! the server, not to this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use bazaar_core::{Money, OrderId, Phone};

use crate::config::EngineConfig;

/// Errors that can occur when requesting a payment token.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("Gateway error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Gateway-provided message, or a body excerpt.
        message: String,
    },

    /// Failed to parse the gateway response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A live payment session returned by the gateway.
///
/// Valid for one redirect; requesting again for the same order yields a new
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    /// One-time token the redirect form posts.
    pub token: String,
    /// Where the browser must POST the token.
    pub payment_url: Url,
    /// When the token was obtained.
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    order_id: &'a str,
    /// Amount in the currency's smallest unit.
    amount: i64,
    phone: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    payment_url: String,
}

/// Client for the payment gateway's token endpoint.
#[derive(Clone)]
pub struct PaymentGatewayClient {
    client: reqwest::Client,
    token_url: String,
}

impl PaymentGatewayClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: config.gateway_token_url.as_str().to_string(),
        }
    }

    /// Request a payment token for a created order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the gateway answers with a
    /// non-success status, or the response is malformed (including a
    /// payment URL that does not parse).
    #[instrument(skip(self, phone), fields(order_id = %order_id, amount = amount.minor_units()))]
    pub async fn request_token(
        &self,
        order_id: &OrderId,
        amount: Money,
        phone: &Phone,
    ) -> Result<PaymentSession, GatewayError> {
        let body = TokenRequest {
            order_id: order_id.as_str(),
            amount: amount.minor_units(),
            phone: phone.as_str(),
        };

        let response = self.client.post(&self.token_url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let payment_url = Url::parse(&token_response.payment_url)
            .map_err(|e| GatewayError::Parse(format!("invalid payment URL: {e}")))?;

        Ok(PaymentSession {
            token: token_response.token,
            payment_url,
            requested_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for PaymentGatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGatewayClient")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Api {
            status: 502,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Gateway error: 502 - upstream unavailable");
    }

    #[test]
    fn test_token_request_shape() {
        let body = TokenRequest {
            order_id: "ord_12",
            amount: 285_000,
            phone: "09123456789",
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({
                "orderId": "ord_12",
                "amount": 285_000,
                "phone": "09123456789"
            })
        );
    }
}
