//! Admin API handlers, mounted under `/api/admin`.
//!
//! Every handler except login, logout, and session status takes a
//! [`RequireAdmin`](crate::middleware::RequireAdmin) or
//! [`RequireWriter`](crate::middleware::RequireWriter) extractor, so an
//! unauthenticated request is rejected before any side effect.

pub mod auth;
pub mod blog_posts;
pub mod orders;
pub mod products;
pub mod support;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/login", post(auth::login).layer(login_rate_limiter()))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session_status))
        // Products
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        // Orders
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show).put(orders::update))
        // Blog
        .route("/blog-posts", get(blog_posts::index).post(blog_posts::create))
        .route(
            "/blog-posts/{id}",
            get(blog_posts::show)
                .put(blog_posts::update)
                .delete(blog_posts::delete),
        )
        // Support requests (proxied)
        .route("/custom-bag-requests", get(support::custom_bag_requests))
        .route(
            "/custom-bag-requests/{id}/status",
            put(support::update_custom_bag_status),
        )
        .route("/repair-requests", get(support::repair_requests))
        .route(
            "/repair-requests/{id}/status",
            put(support::update_repair_status),
        )
        .route(
            "/upload",
            post(support::upload).layer(DefaultBodyLimit::max(support::MAX_UPLOAD_BYTES)),
        )
}
