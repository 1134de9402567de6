//! Paystack-compatible payment gateway client.
//!
//! Stateless: the gateway is the source of truth for every transaction, so
//! nothing about a payment is stored here. Amounts are sent in the minor
//! currency unit (kobo).

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use bagworks_core::Email;

use crate::config::PaystackConfig;

/// Message used when the gateway fails without saying why.
const FALLBACK_MESSAGE: &str = "Payment gateway error";

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a failure.
    #[error("gateway error: {status} - {message}")]
    Gateway { status: StatusCode, message: String },

    /// The gateway answered with something that is not JSON.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

#[derive(Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

/// Payment gateway client.
#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
    callback_url: Option<String>,
}

impl PaystackClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        config: &PaystackConfig,
        timeout: std::time::Duration,
    ) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
            callback_url: config.callback_url.clone(),
        })
    }

    /// Start a transaction for `amount_minor` kobo.
    ///
    /// Returns the gateway's JSON response (authorization URL, reference).
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Gateway` if the gateway rejects the request.
    #[instrument(skip(self, metadata), fields(email = %email))]
    pub async fn initialize(
        &self,
        email: &Email,
        amount_minor: i64,
        metadata: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, PaymentError> {
        let url = format!("{}/transaction/initialize", self.base_url);
        let body = InitializeRequest {
            email: email.as_str(),
            amount: amount_minor,
            metadata,
            callback_url: self.callback_url.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let payload = gateway_payload(response).await?;
        tracing::info!(amount_minor, "Payment initialized");
        Ok(payload)
    }

    /// Look up a transaction by reference.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Gateway` if the gateway reports a failure.
    #[instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<serde_json::Value, PaymentError> {
        let url = format!(
            "{}/transaction/verify/{}",
            self.base_url,
            urlencoding::encode(reference)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        gateway_payload(response).await
    }
}

/// Decode a gateway response, treating non-2xx and `"status": false` alike.
async fn gateway_payload(response: reqwest::Response) -> Result<serde_json::Value, PaymentError> {
    let status = response.status();
    let text = response.text().await?;
    let payload: Option<serde_json::Value> = serde_json::from_str(&text).ok();

    let reported_ok = payload
        .as_ref()
        .and_then(|p| p.get("status"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(true);

    if !status.is_success() || !reported_ok {
        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();
        tracing::warn!(status = status.as_u16(), message = %message, "Gateway reported failure");
        return Err(PaymentError::Gateway { status, message });
    }

    payload.ok_or_else(|| PaymentError::InvalidResponse("body is not JSON".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> PaystackClient {
        let config = PaystackConfig {
            secret_key: SecretString::from("sk_test_gateway"),
            base_url: base_url.to_string(),
            callback_url: Some("https://shop.bagworks.test/checkout/done".to_string()),
        };
        PaystackClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn email() -> Email {
        Email::parse("buyer@bagworks.test").unwrap()
    }

    #[tokio::test]
    async fn test_initialize_sends_minor_units_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("authorization", "Bearer sk_test_gateway"))
            .and(body_partial_json(serde_json::json!({
                "email": "buyer@bagworks.test",
                "amount": 1050,
                "callback_url": "https://shop.bagworks.test/checkout/done",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "data": {
                    "reference": "ref_123",
                    "authorization_url": "https://checkout.test/ref_123",
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server.uri())
            .initialize(&email(), 1050, None)
            .await
            .unwrap();

        assert_eq!(payload["data"]["reference"], "ref_123");
    }

    #[tokio::test]
    async fn test_status_false_is_failure_even_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/ref_404"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": false,
                "message": "Transaction reference not found",
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).verify("ref_404").await.unwrap_err();
        match err {
            PaymentError::Gateway { status, message } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(message, "Transaction reference not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_failure_uses_fallback_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .initialize(&email(), 500, None)
            .await
            .unwrap_err();
        match err {
            PaymentError::Gateway { status, message } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(message, FALLBACK_MESSAGE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_encodes_reference() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/ref%2Fwith%20space"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "status": true,
                    "data": {"status": "success"},
                })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server.uri())
            .verify("ref/with space")
            .await
            .unwrap();
        assert_eq!(payload["data"]["status"], "success");
    }
}
