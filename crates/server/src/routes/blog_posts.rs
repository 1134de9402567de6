//! Public blog routes. Only published posts are visible here.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::BlogPost;
use crate::state::AppState;

/// List published posts, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<BlogPost>> {
    let mut posts = state.store().blog_posts.read().await;
    posts.retain(|p| p.published);
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(posts)
}

/// Show one published post.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<BlogPost>> {
    state
        .store()
        .blog_posts
        .find(&id)
        .await
        .filter(|p| p.published)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Blog post".to_string()))
}
