//! Admin login, logout, and session status.

use axum::{Json, extract::State};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Verify credentials and start an admin session.
///
/// The session id is cycled on success so a pre-login cookie cannot be
/// reused as an authenticated one.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let password = SecretString::from(request.password);

    let admin = match state.auth().login(&request.email, &password).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(email = %request.email, error = %e, "Admin login failed");
            return Err(e.into());
        }
    };

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session cycle failed: {e}")))?;
    set_current_admin(&session, &admin)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    set_sentry_user(admin.email.as_str());
    tracing::info!(admin = %admin.email, role = %admin.role, "Admin logged in");

    Ok(Json(json!({ "success": true, "admin": admin })))
}

/// End the admin session.
///
/// Always succeeds; a missing session is already logged out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Json<serde_json::Value> {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to flush admin session");
    }
    clear_sentry_user();

    Json(json!({ "success": true }))
}

/// Report whether the caller holds a valid admin session.
pub async fn session_status(OptionalAdmin(admin): OptionalAdmin) -> Json<serde_json::Value> {
    match admin {
        Some(admin) => Json(json!({ "authenticated": true, "admin": admin })),
        None => Json(json!({ "authenticated": false })),
    }
}
