//! Liveness and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;

use crate::db;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the data directory cannot be written,
/// or if a `MySQL` pool is configured and the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = probe_data_dir(&state.config().data_dir).await {
        tracing::warn!(error = %e, "Data directory not writable");
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    if let Some(pool) = state.pool() {
        if let Err(e) = db::ping(pool).await {
            tracing::warn!(error = %e, "Database not reachable");
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }

    StatusCode::OK
}

async fn probe_data_dir(dir: &std::path::Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let probe = dir.join(format!(".ready-{}", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await
}
