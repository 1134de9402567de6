//! Integration tests for Bagworks.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bagworks-integration-tests
//! ```
//!
//! No external services are needed: every test drives the full router
//! in-process with `tower::ServiceExt::oneshot`, keeps its JSON files in a
//! fresh temporary directory, and mocks the payment gateway and the
//! support-request backend with `wiremock`.
//!
//! # Test Categories
//!
//! - `storefront` - Catalog, blog, and order placement
//! - `payments` - Gateway initialize and verify
//! - `admin_auth` - Login, logout, session guard, roles
//! - `admin_crud` - Product, order, and blog management
//! - `admin_proxy` - Support-request proxy policies and upload

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use bagworks_core::{AdminRole, Email};
use bagworks_server::app::build_router;
use bagworks_server::config::{AppConfig, BackendConfig, BootstrapAdmin, LogFormat, PaystackConfig};
use bagworks_server::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

/// Bootstrap admin email used by every context.
pub const ADMIN_EMAIL: &str = "owner@bagworks.test";
/// Bootstrap admin password used by every context.
pub const ADMIN_PASSWORD: &str = "Qz7!vLm2#Rb9Tx";
/// Gateway secret sent as the bearer token.
pub const GATEWAY_SECRET: &str = "sk_test_integration";
/// Backend token sent on protected proxy calls.
pub const BACKEND_TOKEN: &str = "backend_integration_token";

/// Client address presented to the login rate limiter.
const CLIENT_IP: &str = "203.0.113.10";

/// A fully wired app with mocked upstreams and its own data directory.
pub struct TestContext {
    pub data_dir: PathBuf,
    pub gateway: MockServer,
    pub backend: MockServer,
    pub state: AppState,
    app: Router,
}

/// Status, headers, and decoded body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or `Value::Null` when the body is empty or not JSON.
    pub json: Value,
    pub text: String,
}

impl TestContext {
    /// Start mock upstreams and build the app.
    pub async fn new() -> Self {
        let gateway = MockServer::start().await;
        let backend = MockServer::start().await;
        let backend_url = backend.uri();
        Self::build(gateway, backend, &backend_url)
    }

    /// Like [`TestContext::new`], but the backend URL points at a closed port.
    pub async fn with_unreachable_backend() -> Self {
        let gateway = MockServer::start().await;
        let backend = MockServer::start().await;
        Self::build(gateway, backend, "http://127.0.0.1:1")
    }

    fn build(gateway: MockServer, backend: MockServer, backend_url: &str) -> Self {
        let data_dir = std::env::temp_dir().join(format!("bagworks-it-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&data_dir).unwrap();

        let config = AppConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            data_dir: data_dir.clone(),
            bootstrap_admin: Some(BootstrapAdmin {
                email: Email::parse(ADMIN_EMAIL).unwrap(),
                password: SecretString::from(ADMIN_PASSWORD),
            }),
            paystack: PaystackConfig {
                secret_key: SecretString::from(GATEWAY_SECRET),
                base_url: gateway.uri(),
                callback_url: None,
            },
            backend: BackendConfig {
                base_url: backend_url.to_string(),
                api_token: Some(SecretString::from(BACKEND_TOKEN)),
            },
            http_timeout: Duration::from_secs(5),
            database: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            log_format: LogFormat::Text,
        };

        let state = AppState::new(config).unwrap();
        let app = build_router(state.clone());

        Self {
            data_dir,
            gateway,
            backend,
            state,
            app,
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Send a request with an optional JSON body and session cookie.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    /// Send a prepared request through the router.
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            json,
            text,
        }
    }

    /// `GET` without a session.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None).await
    }

    /// `POST` a JSON body without a session.
    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body), None).await
    }

    // =========================================================================
    // Admin sessions
    // =========================================================================

    /// Log in and return the `Cookie` header value for the new session.
    pub async fn login_as(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/admin/login",
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.text);
        session_cookie(&response.headers).expect("login did not set a session cookie")
    }

    /// Log in as the bootstrap admin.
    pub async fn login(&self) -> String {
        self.login_as(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Create a file-backed admin account.
    pub async fn create_admin(&self, email: &str, role: AdminRole, password: &str) {
        self.state
            .auth()
            .create_account(email, "Test Admin", role, &SecretString::from(password))
            .await
            .unwrap();
    }

    // =========================================================================
    // Data files
    // =========================================================================

    /// Raw contents of a collection file, if it exists.
    pub fn collection_file(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.data_dir.join(format!("{name}.json"))).ok()
    }

    /// Write a collection file directly.
    pub fn write_collection(&self, name: &str, records: &Value) {
        std::fs::write(
            self.data_dir.join(format!("{name}.json")),
            serde_json::to_string_pretty(records).unwrap(),
        )
        .unwrap();
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.data_dir).ok();
    }
}

/// Extract `adminToken=<id>` from the response's `Set-Cookie` headers.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("adminToken="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
