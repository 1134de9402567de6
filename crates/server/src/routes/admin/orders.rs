//! Admin order management. Orders are never deleted.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{Order, OrderUpdate};
use crate::state::AppState;

/// List orders, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<Order>> {
    let mut orders = state.store().orders.read().await;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(orders)
}

/// Show one order.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    state
        .store()
        .orders
        .find(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// Update status, tracking number, notes, or payment reference.
#[instrument(skip(state, admin, update), fields(admin = %admin.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<OrderUpdate>,
) -> Result<Json<Order>> {
    let now = Utc::now();

    let order = state
        .store()
        .orders
        .update(&id, |order| update.apply(order, now))
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    tracing::info!(
        admin = %admin.email,
        order_id = %order.id,
        status = %order.status,
        "Order updated"
    );
    Ok(Json(order))
}
