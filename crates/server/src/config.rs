//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAYSTACK_SECRET_KEY` - Payment gateway secret key (server-side only)
//!
//! ## Optional
//! - `SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `SERVER_PORT` - Listen port (default: 3000)
//! - `BASE_URL` - Public URL (default: `http://localhost:3000`); `https://` enables secure cookies
//! - `DATA_DIR` - Directory holding the JSON collections (default: ./data)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - Bootstrap admin account (set both or neither)
//! - `PAYSTACK_BASE_URL` - Payment gateway API (default: `https://api.paystack.co`)
//! - `PAYSTACK_CALLBACK_URL` - Where the gateway redirects after checkout
//! - `BACKEND_API_URL` - Support-request backend (default: `http://localhost:5000/api`)
//! - `BACKEND_API_TOKEN` - Bearer token sent on protected backend calls
//! - `HTTP_TIMEOUT_SECS` - Outbound request timeout (default: 30)
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` - `MySQL` helper pool
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `text` (default) or `json`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use bagworks_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ADMIN_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_BACKEND_API_URL: &str = "http://localhost:5000/api";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "admin123",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Directory holding `products.json`, `orders.json`, ...
    pub data_dir: PathBuf,
    /// Admin account configured through the environment
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Payment gateway configuration
    pub paystack: PaystackConfig,
    /// Support-request backend configuration
    pub backend: BackendConfig,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Optional `MySQL` connection parameters
    pub database: Option<DatabaseConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
    /// Log line format
    pub log_format: LogFormat,
}

/// Admin account defined by `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: Email,
    pub password: SecretString,
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: SecretString,
    pub base_url: String,
    pub callback_url: Option<String>,
}

/// Upstream backend for custom-bag and repair requests.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_token: Option<SecretString>,
}

/// `MySQL` connection parameters.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub database: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the bootstrap admin password fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("SERVER_HOST", "127.0.0.1")?;
        let port = parse_env("SERVER_PORT", "3000")?;
        let base_url = get_env_or_default("BASE_URL", "http://localhost:3000");
        let data_dir = data_dir_from_env();
        let http_timeout = Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", "30")?);

        Ok(Self {
            host,
            port,
            base_url,
            data_dir,
            bootstrap_admin: BootstrapAdmin::from_env()?,
            paystack: PaystackConfig::from_env()?,
            backend: BackendConfig::from_env()?,
            http_timeout,
            database: DatabaseConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
            log_format: match get_env_or_default("LOG_FORMAT", "text").as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                other => {
                    return Err(ConfigError::InvalidEnvVar(
                        "LOG_FORMAT".to_string(),
                        format!("expected 'text' or 'json', got '{other}'"),
                    ));
                }
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Directory holding the JSON collections (`DATA_DIR`, default `./data`).
///
/// Shared with `bw-cli`, which does not need the rest of the server config.
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    PathBuf::from(get_env_or_default("DATA_DIR", "./data"))
}

impl BootstrapAdmin {
    /// Read the optional `ADMIN_EMAIL` / `ADMIN_PASSWORD` pair.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if only one of the pair is set, the email is
    /// malformed, or the password is insecure.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match (get_optional_env("ADMIN_EMAIL"), get_optional_env("ADMIN_PASSWORD")) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("ADMIN_EMAIL".to_string())),
            (Some(email), Some(password)) => {
                let email = Email::parse(&email).map_err(|e| {
                    ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string())
                })?;
                validate_admin_password(&password, "ADMIN_PASSWORD")?;
                Ok(Some(Self {
                    email,
                    password: SecretString::from(password),
                }))
            }
        }
    }
}

impl PaystackConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_required_secret("PAYSTACK_SECRET_KEY")?,
            base_url: get_url_env("PAYSTACK_BASE_URL", DEFAULT_PAYSTACK_BASE_URL)?,
            callback_url: get_optional_env("PAYSTACK_CALLBACK_URL"),
        })
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_url_env("BACKEND_API_URL", DEFAULT_BACKEND_API_URL)?,
            api_token: get_optional_env("BACKEND_API_TOKEN").map(SecretString::from),
        })
    }
}

impl DatabaseConfig {
    /// Read the `MySQL` settings; `None` unless `DB_HOST` is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DB_HOST` is set but another required
    /// variable is missing or invalid.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("DB_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            host,
            port: parse_env("DB_PORT", "3306")?,
            user: get_required_env("DB_USER")?,
            password: get_required_secret("DB_PASSWORD")?,
            database: get_required_env("DB_NAME")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a URL-valued variable, validated and without a trailing slash.
fn get_url_env(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject short, placeholder, or low-entropy admin passwords.
fn validate_admin_password(password: &str, var_name: &str) -> Result<(), ConfigError> {
    if password.chars().count() < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters"),
        ));
    }

    let lower = password.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(password);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Expose the bootstrap password for comparison. Kept here so the secret
/// only leaves `SecretString` in one place.
pub(crate) fn bootstrap_password(admin: &BootstrapAdmin) -> &str {
    admin.password.expose_secret()
}
