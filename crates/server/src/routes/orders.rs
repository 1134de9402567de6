//! Storefront order placement.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;

use bagworks_core::OrderId;

use crate::error::{ApiJson, AppError, Result};
use crate::models::{NewOrder, Order};
use crate::state::AppState;
use crate::store::unique_timestamp_id;

/// Place an order.
///
/// The storefront is trusted, so the payload is stored as sent apart from
/// the server-stamped `createdAt`. A supplied `id` that is already taken is
/// rejected rather than overwriting the stored order.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let now = Utc::now();

    let order = state
        .store()
        .orders
        .insert_with(|orders| {
            let id = match payload.id.clone() {
                Some(id) if orders.iter().any(|o| o.id == id) => {
                    return Err(AppError::Conflict(format!("Order {id} already exists")));
                }
                Some(id) => id,
                None => OrderId::new(unique_timestamp_id(orders, now.timestamp_millis())),
            };
            Ok(payload.into_order(id, now))
        })
        .await?;

    tracing::info!(order_id = %order.id, items = order.items.len(), "Order placed");
    Ok((StatusCode::CREATED, Json(order)))
}
