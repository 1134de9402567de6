//! Admin views of custom-bag and repair requests, and image upload.
//!
//! These records live in the support-request backend. Listings fail open so
//! the dashboard still renders when the backend is down; status changes and
//! uploads fail closed.

use axum::{
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
    },
    http::Method,
};
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::CurrentAdmin;
use crate::services::{FailurePolicy, ForwardBody, ProxyResponse, UpstreamAuth};
use crate::state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// List custom-bag requests.
#[instrument(skip(state, _admin))]
pub async fn custom_bag_requests(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ProxyResponse> {
    list(&state, "custom-bag-requests", UpstreamAuth::None).await
}

/// Change the status of a custom-bag request.
#[instrument(skip(state, admin, body), fields(admin = %admin.email))]
pub async fn update_custom_bag_status(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<ProxyResponse> {
    update_status(&state, &admin, "custom-bag-requests", &id, body).await
}

/// List repair requests.
#[instrument(skip(state, _admin))]
pub async fn repair_requests(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ProxyResponse> {
    list(&state, "repair-requests", UpstreamAuth::Bearer).await
}

/// Change the status of a repair request.
#[instrument(skip(state, admin, body), fields(admin = %admin.email))]
pub async fn update_repair_status(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<ProxyResponse> {
    update_status(&state, &admin, "repair-requests", &id, body).await
}

/// Forward a multipart image upload to the backend.
///
/// File fields keep their file name and content type; other fields are
/// passed as text.
#[instrument(skip(state, admin, multipart), fields(admin = %admin.email))]
pub async fn upload(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ProxyResponse> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut form = Form::new();
    let mut files = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or("file").to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        form = match file_name {
            Some(file_name) => {
                files += 1;
                let mut part = Part::bytes(data.to_vec()).file_name(file_name);
                if let Some(content_type) = content_type {
                    part = part
                        .mime_str(&content_type)
                        .map_err(|_| {
                            AppError::BadRequest(format!("Invalid content type: {content_type}"))
                        })?;
                }
                form.part(name, part)
            }
            None => form.text(name, String::from_utf8_lossy(&data).into_owned()),
        };
    }

    if files == 0 {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    }

    tracing::info!(admin = %admin.email, files, "Forwarding upload");
    let response = state
        .backend()
        .forward(
            Method::POST,
            "upload",
            UpstreamAuth::Bearer,
            ForwardBody::Multipart(form),
            FailurePolicy::FailClosed,
        )
        .await?;
    Ok(response)
}

async fn list(state: &AppState, path: &str, auth: UpstreamAuth) -> Result<ProxyResponse> {
    let response = state
        .backend()
        .forward(
            Method::GET,
            path,
            auth,
            ForwardBody::Empty,
            FailurePolicy::FailOpenEmpty,
        )
        .await?;
    Ok(response)
}

async fn update_status(
    state: &AppState,
    admin: &CurrentAdmin,
    collection: &str,
    id: &str,
    body: serde_json::Value,
) -> Result<ProxyResponse> {
    validate_status_body(&body)?;

    let path = format!("{collection}/{}/status", urlencoding::encode(id));
    let response = state
        .backend()
        .forward(
            Method::PUT,
            &path,
            UpstreamAuth::Bearer,
            ForwardBody::Json(body),
            FailurePolicy::FailClosed,
        )
        .await?;

    tracing::info!(
        admin = %admin.email,
        collection,
        request_id = %id,
        status = %response.status,
        "Support request status forwarded"
    );
    Ok(response)
}

/// The body must be an object with a non-empty string `status`; it is
/// forwarded as-is otherwise.
fn validate_status_body(body: &serde_json::Value) -> Result<()> {
    let has_status = body
        .get("status")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());

    if has_status {
        Ok(())
    } else {
        Err(AppError::BadRequest("Status is required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_body_validation() {
        assert!(validate_status_body(&json!({"status": "in_progress"})).is_ok());
        assert!(validate_status_body(&json!({"status": "done", "note": "x"})).is_ok());
        assert!(validate_status_body(&json!({"status": "  "})).is_err());
        assert!(validate_status_body(&json!({"status": 3})).is_err());
        assert!(validate_status_body(&json!({})).is_err());
        assert!(validate_status_body(&json!(["status"])).is_err());
    }
}
