//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! BW_ADMIN_PASSWORD='...' bw-cli admin create -e admin@example.com -n "Admin Name" -r admin
//! bw-cli admin list
//! bw-cli admin remove -e admin@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `DATA_DIR` - Directory holding `admins.json` (default `./data`)
//! - `BW_ADMIN_PASSWORD` - Password for `admin create`; read from stdin if unset
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - Bootstrap admin, whose email cannot be reused

use std::io::BufRead;

use bagworks_core::AdminRole;
use bagworks_server::config::{BootstrapAdmin, ConfigError, data_dir_from_env};
use bagworks_server::services::{AdminAuthService, AuthError};
use bagworks_server::store::Store;
use secrecy::SecretString;
use thiserror::Error;

/// Environment variable read for the new account's password.
const PASSWORD_ENV: &str = "BW_ADMIN_PASSWORD";

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Bootstrap admin settings are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No password supplied.
    #[error("No password given: set {PASSWORD_ENV} or type it on stdin")]
    MissingPassword,

    /// Reading the password from stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// Account operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No account with this email.
    #[error("No admin account with email: {0}")]
    NotFound(String),
}

fn auth_service() -> Result<AdminAuthService, AdminError> {
    let store = Store::new(&data_dir_from_env());
    Ok(AdminAuthService::new(store.admins, BootstrapAdmin::from_env()?))
}

/// Create a new admin account.
///
/// # Errors
///
/// Returns an error for an unknown role, a missing or weak password, or an
/// email that is malformed or already taken.
pub async fn create(email: &str, name: &str, role: &str) -> Result<(), AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let password = read_password()?;
    let service = auth_service()?;

    tracing::info!("Creating admin account: {} ({})", email, role);
    let account = service.create_account(email, name, role, &password).await?;

    tracing::info!(
        "Admin account created successfully! Email: {}, Role: {}",
        account.email,
        account.role
    );
    Ok(())
}

/// List admin accounts.
///
/// # Errors
///
/// Returns an error if the bootstrap settings are invalid.
pub async fn list() -> Result<(), AdminError> {
    let service = auth_service()?;
    let accounts = service.list_accounts().await;

    if accounts.is_empty() {
        tracing::info!("No admin accounts in admins.json");
    }
    for account in &accounts {
        tracing::info!(
            email = %account.email,
            name = %account.name,
            role = %account.role,
            created_at = %account.created_at.format("%Y-%m-%d"),
            "Admin account"
        );
    }
    Ok(())
}

/// Remove an admin account. Active sessions end on their next request.
///
/// # Errors
///
/// Returns an error if no account has this email or the file cannot be written.
pub async fn remove(email: &str) -> Result<(), AdminError> {
    let service = auth_service()?;

    if !service.remove_account(email).await? {
        return Err(AdminError::NotFound(email.to_owned()));
    }

    tracing::info!("Admin account removed: {}", email);
    Ok(())
}

/// Read the password from `BW_ADMIN_PASSWORD`, else the first stdin line.
fn read_password() -> Result<SecretString, AdminError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        if !password.is_empty() {
            return Ok(SecretString::from(password));
        }
    }

    tracing::info!("Enter password for the new account:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    password_from_line(&line)
}

fn password_from_line(line: &str) -> Result<SecretString, AdminError> {
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AdminError::MissingPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_password_line_strips_newline_only() {
        let password = password_from_line(" spaced pass phrase \r\n").unwrap();
        assert_eq!(password.expose_secret(), " spaced pass phrase ");
    }

    #[test]
    fn test_empty_password_line_rejected() {
        assert!(matches!(
            password_from_line("\n"),
            Err(AdminError::MissingPassword)
        ));
    }
}
