//! Authentication extractors for admin routes.
//!
//! The session cookie only carries an opaque id; the admin identity lives in
//! the server-side session. Every extraction re-resolves the account, so a
//! removed admin loses access on their next request and role changes apply
//! immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires admin authentication.
///
/// Rejects with 401 before the handler runs, so no persistence or proxy
/// side effect happens for unauthenticated callers.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(AppError::unauthorized)?;

        current_admin(&session, state)
            .await
            .map(Self)
            .ok_or_else(AppError::unauthorized)
    }
}

/// Extractor that requires an admin whose role may modify data.
///
/// Returns 401 without a session and 403 for read-only roles.
pub struct RequireWriter(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireWriter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(parts, state).await?;

        if !admin.role.can_write() {
            tracing::warn!(
                admin = %admin.email,
                role = %admin.role,
                "Write attempt by read-only admin"
            );
            return Err(AppError::Forbidden(format!(
                "role {} cannot modify data",
                admin.role
            )));
        }

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdmin`, this does not reject the request if no admin is logged in.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl FromRequestParts<AppState> for OptionalAdmin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>().cloned() {
            Some(session) => current_admin(&session, state).await,
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Load the session identity and check the account still exists.
///
/// A session whose account has been removed is flushed.
async fn current_admin(session: &Session, state: &AppState) -> Option<CurrentAdmin> {
    let stored: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()?;

    let Some(fresh) = state.auth().resolve(&stored.email).await else {
        tracing::info!(admin = %stored.email, "Session for removed admin revoked");
        if let Err(e) = session.flush().await {
            tracing::warn!(error = %e, "Failed to flush revoked session");
        }
        return None;
    };

    if fresh != stored {
        if let Err(e) = set_current_admin(session, &fresh).await {
            tracing::warn!(error = %e, "Failed to refresh session identity");
        }
    }

    Some(fresh)
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to end the admin session (logout).
///
/// Deletes the server-side record, so the old cookie value is useless even
/// if it was copied.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
