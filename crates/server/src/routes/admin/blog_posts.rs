//! Admin blog management. Unlike the public routes, drafts are visible here.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use bagworks_core::BlogPostId;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{BlogPost, BlogPostUpdate, NewBlogPost};
use crate::state::AppState;
use crate::store::unique_timestamp_id;

/// List all posts, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<BlogPost>> {
    let mut posts = state.store().blog_posts.read().await;
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(posts)
}

/// Create a post.
#[instrument(skip(state, admin, payload), fields(admin = %admin.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ApiJson(payload): ApiJson<NewBlogPost>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let now = Utc::now();

    let post = state
        .store()
        .blog_posts
        .insert_with(|posts| {
            let id = BlogPostId::new(unique_timestamp_id(posts, now.timestamp_millis()));
            payload.into_post(id, now).map_err(AppError::from)
        })
        .await?;

    tracing::info!(
        admin = %admin.email,
        post_id = %post.id,
        published = post.published,
        "Blog post created"
    );
    Ok((StatusCode::CREATED, Json(post)))
}

/// Show one post, published or not.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>> {
    state
        .store()
        .blog_posts
        .find(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Blog post".to_string()))
}

/// Update a post.
#[instrument(skip(state, admin, update), fields(admin = %admin.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<BlogPostUpdate>,
) -> Result<Json<BlogPost>> {
    update.validate()?;
    let now = Utc::now();

    let post = state
        .store()
        .blog_posts
        .update(&id, |post| update.apply(post, now))
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post".to_string()))?;

    tracing::info!(admin = %admin.email, post_id = %post.id, "Blog post updated");
    Ok(Json(post))
}

/// Delete a post.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .store()
        .blog_posts
        .remove(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post".to_string()))?;

    tracing::info!(admin = %admin.email, post_id = %id, "Blog post deleted");
    Ok(StatusCode::NO_CONTENT)
}
