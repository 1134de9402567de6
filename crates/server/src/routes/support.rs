//! Storefront submissions of custom-bag and repair requests.
//!
//! The backend owns these records; this service only relays the submission
//! and the backend's answer.

use axum::{extract::State, http::Method};
use tracing::instrument;

use crate::error::{ApiJson, Result};
use crate::services::{FailurePolicy, ForwardBody, ProxyResponse, UpstreamAuth};
use crate::state::AppState;

/// Submit a custom-bag request.
#[instrument(skip(state, body))]
pub async fn create_custom_bag_request(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<ProxyResponse> {
    submit(&state, "custom-bag-requests", body).await
}

/// Submit a repair request.
#[instrument(skip(state, body))]
pub async fn create_repair_request(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<ProxyResponse> {
    submit(&state, "repair-requests", body).await
}

async fn submit(state: &AppState, path: &str, body: serde_json::Value) -> Result<ProxyResponse> {
    let response = state
        .backend()
        .forward(
            Method::POST,
            path,
            UpstreamAuth::None,
            ForwardBody::Json(body),
            FailurePolicy::FailClosed,
        )
        .await?;
    Ok(response)
}
