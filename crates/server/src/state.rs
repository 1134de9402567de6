//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::MySqlPool;

use crate::config::AppConfig;
use crate::db;
use crate::services::{AdminAuthService, BackendClient, BackendError, PaymentError, PaystackClient};
use crate::store::Store;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the collections, HTTP clients, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Store,
    auth: AdminAuthService,
    backend: BackendClient,
    paystack: PaystackClient,
    pool: Option<MySqlPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The `MySQL` pool is created lazily when database settings are present.
    ///
    /// # Errors
    ///
    /// Returns an error if an outbound HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, StateError> {
        let store = Store::new(&config.data_dir);
        let auth = AdminAuthService::new(store.admins.clone(), config.bootstrap_admin.clone());
        let backend = BackendClient::new(&config.backend, config.http_timeout)?;
        let paystack = PaystackClient::new(&config.paystack, config.http_timeout)?;
        let pool = config.database.as_ref().map(db::create_pool);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                backend,
                paystack,
                pool,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the JSON collections.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the admin authentication service.
    #[must_use]
    pub fn auth(&self) -> &AdminAuthService {
        &self.inner.auth
    }

    /// Get a reference to the support-request backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn paystack(&self) -> &PaystackClient {
        &self.inner.paystack
    }

    /// Get the `MySQL` pool, if database settings were provided.
    #[must_use]
    pub fn pool(&self) -> Option<&MySqlPool> {
        self.inner.pool.as_ref()
    }
}
