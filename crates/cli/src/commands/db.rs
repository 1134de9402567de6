//! `MySQL` connectivity check.
//!
//! # Environment Variables
//!
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`

use bagworks_server::config::{ConfigError, DatabaseConfig};
use bagworks_server::db;
use thiserror::Error;

/// Errors that can occur while checking the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// `DB_HOST` is not set.
    #[error("DB_HOST is not set; the MySQL helper is disabled")]
    NotConfigured,

    /// Database settings are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect and run `SELECT 1`.
///
/// # Errors
///
/// Returns an error if the database is not configured or not reachable.
pub async fn ping() -> Result<(), DbError> {
    let config = DatabaseConfig::from_env()?.ok_or(DbError::NotConfigured)?;

    tracing::info!("Connecting to {}:{}/{}...", config.host, config.port, config.database);
    let pool = db::create_pool(&config);
    db::ping(&pool).await?;
    pool.close().await;

    tracing::info!("Database reachable");
    Ok(())
}
