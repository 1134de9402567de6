//! Payment gateway routes.
//!
//! Both routes validate their input before any outbound call, so a bad
//! request never reaches the gateway.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bagworks_core::{Email, Price};

use crate::error::{ApiJson, AppError, Result};
use crate::services::PaymentError;
use crate::state::AppState;

/// Body of `POST /api/payments/initialize`.
#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub email: Option<String>,
    /// Amount in major units, as a number or numeric string.
    pub amount: Option<serde_json::Value>,
    /// Passed through to the gateway unchanged.
    pub metadata: Option<serde_json::Value>,
}

/// Query of `GET /api/payments/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub reference: Option<String>,
}

/// Start a checkout transaction.
#[instrument(skip(state, request))]
pub async fn initialize(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InitializeRequest>,
) -> Result<Json<serde_json::Value>> {
    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
    let email = Email::parse(email)
        .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;

    let amount = request
        .amount
        .as_ref()
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::BadRequest("Amount is required".to_string()))?;
    let amount_minor = Price::try_from(amount)
        .and_then(|price| price.to_minor_units())
        .map_err(|e| AppError::BadRequest(format!("Invalid amount: {e}")))?;

    let payload = state
        .paystack()
        .initialize(&email, amount_minor, request.metadata.as_ref())
        .await
        .map_err(initialize_error)?;

    Ok(Json(payload))
}

/// Look up a transaction by reference.
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<serde_json::Value>> {
    let reference = query
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("Reference is required".to_string()))?;

    let payload = state
        .paystack()
        .verify(reference)
        .await
        .map_err(verify_error)?;

    Ok(Json(payload))
}

/// Initialize failures are client errors: the gateway's 4xx if it sent one, else 400.
fn initialize_error(err: PaymentError) -> AppError {
    match err {
        PaymentError::Gateway { status, message } => AppError::Gateway {
            status: if status.is_client_error() {
                status
            } else {
                StatusCode::BAD_REQUEST
            },
            message,
        },
        other => other.into(),
    }
}

/// Verify failures keep the gateway status, except a 2xx carrying `status: false`.
fn verify_error(err: PaymentError) -> AppError {
    match err {
        PaymentError::Gateway { status, message } => AppError::Gateway {
            status: if status.is_success() {
                StatusCode::BAD_REQUEST
            } else {
                status
            },
            message,
        },
        other => other.into(),
    }
}
