//! Admin authentication service.
//!
//! Admins come from two places: the bootstrap account configured through
//! `ADMIN_EMAIL` / `ADMIN_PASSWORD`, and accounts in `admins.json` created
//! with `bw-cli`. File accounts store Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::instrument;

use bagworks_core::{AdminRole, Email};

use crate::config::{BootstrapAdmin, bootstrap_password};
use crate::models::{AdminAccount, CurrentAdmin};
use crate::store::JsonCollection;

/// Minimum password length for file accounts.
const MIN_PASSWORD_LENGTH: usize = 12;

/// Display name of the bootstrap admin.
const BOOTSTRAP_ADMIN_NAME: &str = "Administrator";

/// Admin authentication service.
///
/// Cheap to clone; holds the account collection handle and the optional
/// bootstrap credentials.
#[derive(Clone)]
pub struct AdminAuthService {
    accounts: JsonCollection<AdminAccount>,
    bootstrap: Option<BootstrapAdmin>,
}

impl AdminAuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(accounts: JsonCollection<AdminAccount>, bootstrap: Option<BootstrapAdmin>) -> Self {
        Self {
            accounts,
            bootstrap,
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentAdmin, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        if let Some(bootstrap) = self.bootstrap.as_ref().filter(|b| b.email == email) {
            if !digest_matches(bootstrap_password(bootstrap), password.expose_secret()) {
                return Err(AuthError::InvalidCredentials);
            }
            return Ok(bootstrap_identity(bootstrap));
        }

        let account = self
            .accounts
            .find(email.as_str())
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = account.password_hash.clone();
        let candidate = password.expose_secret().to_owned();
        tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
            .await
            .map_err(|_| AuthError::PasswordHash)??;

        Ok(account.to_current())
    }

    /// Look up the current identity for an email.
    ///
    /// Returns `None` when the account no longer exists. The role is read
    /// fresh, so demotions take effect on the next request.
    pub async fn resolve(&self, email: &Email) -> Option<CurrentAdmin> {
        if let Some(bootstrap) = self.bootstrap.as_ref().filter(|b| &b.email == email) {
            return Some(bootstrap_identity(bootstrap));
        }

        self.accounts
            .find(email.as_str())
            .await
            .map(|account| account.to_current())
    }

    /// List file accounts.
    pub async fn list_accounts(&self) -> Vec<AdminAccount> {
        self.accounts.read().await
    }

    /// Create a file account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email,
    /// `AuthError::WeakPassword` for a short password, and
    /// `AuthError::AccountExists` if the email is already taken (including
    /// by the bootstrap admin).
    pub async fn create_account(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &SecretString,
    ) -> Result<AdminAccount, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;

        if self.bootstrap.as_ref().is_some_and(|b| b.email == email) {
            return Err(AuthError::AccountExists);
        }

        let account = AdminAccount {
            email,
            name: name.trim().to_string(),
            role,
            password_hash: hash_password(password.expose_secret())?,
            created_at: Utc::now(),
        };

        self.accounts
            .insert_with(|accounts| {
                if accounts.iter().any(|a| a.email == account.email) {
                    return Err(AuthError::AccountExists);
                }
                Ok(account)
            })
            .await
    }

    /// Remove a file account.
    ///
    /// Returns `false` if no account had this email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email, or a store
    /// error if the file cannot be written.
    pub async fn remove_account(&self, email: &str) -> Result<bool, AuthError> {
        let email = Email::parse(email)?;
        Ok(self.accounts.remove(email.as_str()).await?.is_some())
    }
}

fn bootstrap_identity(bootstrap: &BootstrapAdmin) -> CurrentAdmin {
    CurrentAdmin {
        email: bootstrap.email.clone(),
        name: BOOTSTRAP_ADMIN_NAME.to_string(),
        role: AdminRole::SuperAdmin,
    }
}

/// Compare two secrets by their SHA-256 digests in constant time.
///
/// Hashing first makes the comparison length-independent.
fn digest_matches(expected: &str, provided: &str) -> bool {
    let expected = hex::encode(Sha256::digest(expected.as_bytes()));
    let provided = hex::encode(Sha256::digest(provided.as_bytes()));
    constant_time_compare(&expected, &provided)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(bootstrap: bool) -> AdminAuthService {
        let dir = std::env::temp_dir().join(format!("bagworks-auth-{}", uuid::Uuid::new_v4()));
        let bootstrap = bootstrap.then(|| BootstrapAdmin {
            email: Email::parse("owner@bagworks.test").unwrap(),
            password: SecretString::from("Qz7!vLm2#Rb9Tx"),
        });
        AdminAuthService::new(JsonCollection::new(&dir, "admins"), bootstrap)
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello!"));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(verify_password("wrong horse battery", &hash).is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_login() {
        let auth = service(true);

        let admin = auth
            .login(" Owner@Bagworks.test ", &secret("Qz7!vLm2#Rb9Tx"))
            .await
            .unwrap();
        assert_eq!(admin.role, AdminRole::SuperAdmin);

        assert!(matches!(
            auth.login("owner@bagworks.test", &secret("nope")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_file_account_lifecycle() {
        let auth = service(false);
        let password = secret("a-long-enough-passphrase");

        auth.create_account("clerk@bagworks.test", "Clerk", AdminRole::Viewer, &password)
            .await
            .unwrap();
        assert!(matches!(
            auth.create_account("CLERK@bagworks.test", "Dup", AdminRole::Admin, &password)
                .await,
            Err(AuthError::AccountExists)
        ));

        let admin = auth.login("clerk@bagworks.test", &password).await.unwrap();
        assert_eq!(admin.name, "Clerk");
        assert_eq!(admin.role, AdminRole::Viewer);

        assert!(auth.remove_account("clerk@bagworks.test").await.unwrap());
        assert!(auth.resolve(&admin.email).await.is_none());
        assert!(auth.login("clerk@bagworks.test", &password).await.is_err());
    }

    #[tokio::test]
    async fn test_create_account_rejects_short_password() {
        let auth = service(false);
        let result = auth
            .create_account("a@b.co", "A", AdminRole::Admin, &secret("short"))
            .await;
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn test_create_account_rejects_bootstrap_email() {
        let auth = service(true);
        let result = auth
            .create_account(
                "owner@bagworks.test",
                "Owner",
                AdminRole::Admin,
                &secret("another-long-passphrase"),
            )
            .await;
        assert!(matches!(result, Err(AuthError::AccountExists)));
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let auth = service(true);
        assert!(matches!(
            auth.login("nobody@bagworks.test", &secret("whatever-password")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("not an email", &secret("whatever-password")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
