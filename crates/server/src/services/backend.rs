//! Client for the support-request backend.
//!
//! Custom-bag and repair requests live in a separate service. Every call
//! through [`BackendClient::forward`] names its [`FailurePolicy`]: listings
//! degrade to an empty array so the admin UI keeps rendering, while writes
//! relay the upstream outcome so failures stay visible.

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use crate::config::BackendConfig;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What to do when the upstream call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Relay the upstream status and body; transport errors become errors.
    FailClosed,
    /// Answer `200 []` on any failure.
    FailOpenEmpty,
}

/// Whether the call carries the backend bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamAuth {
    None,
    Bearer,
}

/// Request body to forward.
#[derive(Debug)]
pub enum ForwardBody {
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

/// Upstream response relayed to the client.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl ProxyResponse {
    /// The fail-open fallback: `200` with an empty JSON array.
    #[must_use]
    pub fn empty_list() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: Bytes::from_static(b"[]"),
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig, timeout: std::time::Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Forward a request to `{base_url}/{path}`.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::FailClosed`], returns `BackendError::Http` when
    /// no response arrives. Under [`FailurePolicy::FailOpenEmpty`] this never
    /// fails.
    #[instrument(skip(self, body), fields(upstream_status = tracing::field::Empty))]
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        auth: UpstreamAuth,
        body: ForwardBody,
        policy: FailurePolicy,
    ) -> Result<ProxyResponse, BackendError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut request = self.client.request(method, &url);
        if auth == UpstreamAuth::Bearer {
            match &self.api_token {
                Some(token) => request = request.bearer_auth(token.expose_secret()),
                None => tracing::debug!("BACKEND_API_TOKEN not set, sending without bearer"),
            }
        }
        request = match body {
            ForwardBody::Empty => request,
            ForwardBody::Json(value) => request.json(&value),
            ForwardBody::Multipart(form) => request.multipart(form),
        };

        let result = request.send().await;

        match policy {
            FailurePolicy::FailClosed => {
                let response = result.inspect_err(|e| {
                    tracing::error!(error = %e, "Backend request failed");
                })?;
                tracing::Span::current().record("upstream_status", response.status().as_u16());
                relay(response).await
            }
            FailurePolicy::FailOpenEmpty => Ok(fail_open(result).await),
        }
    }
}

/// Relay status and body. The body gets a JSON content type when it parses
/// as JSON, otherwise the upstream content type is kept.
async fn relay(response: reqwest::Response) -> Result<ProxyResponse, BackendError> {
    let status = response.status();
    let upstream_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let body = response.bytes().await?;

    let content_type = if serde_json::from_slice::<serde_json::Value>(&body).is_ok() {
        Some(HeaderValue::from_static("application/json"))
    } else {
        upstream_type
    };

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Backend returned an error, relaying");
    }

    Ok(ProxyResponse {
        status,
        content_type,
        body,
    })
}

async fn fail_open(result: Result<reqwest::Response, reqwest::Error>) -> ProxyResponse {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Backend unreachable, serving empty list");
            return ProxyResponse::empty_list();
        }
    };

    let status = response.status();
    tracing::Span::current().record("upstream_status", status.as_u16());
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Backend returned an error, serving empty list");
        return ProxyResponse::empty_list();
    }

    match response.bytes().await {
        Ok(body) if serde_json::from_slice::<serde_json::Value>(&body).is_ok() => ProxyResponse {
            status: StatusCode::OK,
            content_type: Some(HeaderValue::from_static("application/json")),
            body,
        },
        Ok(_) => {
            tracing::warn!("Backend returned a non-JSON body, serving empty list");
            ProxyResponse::empty_list()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Backend body unreadable, serving empty list");
            ProxyResponse::empty_list()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str, token: Option<&str>) -> BackendClient {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            api_token: token.map(|t| SecretString::from(t.to_string())),
        };
        BackendClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fail_open_masks_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repair-requests"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let response = client(&server.uri(), None)
            .forward(
                Method::GET,
                "repair-requests",
                UpstreamAuth::None,
                ForwardBody::Empty,
                FailurePolicy::FailOpenEmpty,
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"[]");
    }

    #[tokio::test]
    async fn test_fail_open_masks_unreachable_upstream() {
        let response = client("http://127.0.0.1:9", None)
            .forward(
                Method::GET,
                "custom-bag-requests",
                UpstreamAuth::None,
                ForwardBody::Empty,
                FailurePolicy::FailOpenEmpty,
            )
            .await
            .unwrap();

        assert_eq!(&response.body[..], b"[]");
    }

    #[tokio::test]
    async fn test_fail_open_masks_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let response = client(&server.uri(), None)
            .forward(
                Method::GET,
                "custom-bag-requests",
                UpstreamAuth::None,
                ForwardBody::Empty,
                FailurePolicy::FailOpenEmpty,
            )
            .await
            .unwrap();

        assert_eq!(&response.body[..], b"[]");
    }

    #[tokio::test]
    async fn test_fail_closed_relays_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repair-requests/7/status"))
            .and(header_eq("authorization", "Bearer backend-token"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"error": "bad status"})),
            )
            .mount(&server)
            .await;

        let response = client(&server.uri(), Some("backend-token"))
            .forward(
                Method::PUT,
                "repair-requests/7/status",
                UpstreamAuth::Bearer,
                ForwardBody::Json(serde_json::json!({"status": "bogus"})),
                FailurePolicy::FailClosed,
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "bad status");
        assert_eq!(
            response.content_type.unwrap(),
            HeaderValue::from_static("application/json")
        );
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_transport_error() {
        let result = client("http://127.0.0.1:9", None)
            .forward(
                Method::PUT,
                "repair-requests/7/status",
                UpstreamAuth::Bearer,
                ForwardBody::Empty,
                FailurePolicy::FailClosed,
            )
            .await;

        assert!(matches!(result, Err(BackendError::Http(_))));
    }
}
