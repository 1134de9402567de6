//! Admin product management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use bagworks_core::ProductId;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::state::AppState;
use crate::store::unique_timestamp_id;

/// List all products.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<Product>> {
    Json(state.store().products.read().await)
}

/// Create a product.
#[instrument(skip(state, admin, payload), fields(admin = %admin.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ApiJson(payload): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let now = Utc::now();

    let product = state
        .store()
        .products
        .insert_with(|products| {
            let id = ProductId::new(unique_timestamp_id(products, now.timestamp_millis()));
            payload.into_product(id, now).map_err(AppError::from)
        })
        .await?;

    tracing::info!(admin = %admin.email, product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Show one product.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    state
        .store()
        .products
        .find(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Update a product. Absent fields keep their stored value.
#[instrument(skip(state, admin, update), fields(admin = %admin.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Product>> {
    update.validate()?;
    let now = Utc::now();

    let product = state
        .store()
        .products
        .update(&id, |product| update.apply(product, now))
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    tracing::info!(admin = %admin.email, product_id = %product.id, "Product updated");
    Ok(Json(product))
}

/// Delete a product.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .store()
        .products
        .remove(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    tracing::info!(admin = %admin.email, product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
