//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness (data dir, MySQL)
//!
//! # Catalog
//! GET  /api/products                        - Product listing (?category=)
//! GET  /api/products/{id}                   - Product detail
//! GET  /api/blog-posts                      - Published posts, newest first
//! GET  /api/blog-posts/{id}                 - Published post detail
//!
//! # Checkout
//! POST /api/orders                          - Place an order
//! POST /api/payments/initialize             - Start a gateway transaction
//! GET  /api/payments/verify?reference=      - Verify a transaction
//!
//! # Support requests (forwarded to the backend)
//! POST /api/custom-bag-requests             - Submit a custom-bag request
//! POST /api/repair-requests                 - Submit a repair request
//!
//! # Admin (session required unless noted)
//! POST /api/admin/login                     - Login (rate limited, public)
//! POST /api/admin/logout                    - Logout (public)
//! GET  /api/admin/session                   - Session status (public)
//! GET  /api/admin/products                  - List products
//! POST /api/admin/products                  - Create product
//! GET  /api/admin/products/{id}             - Product detail
//! PUT  /api/admin/products/{id}             - Update product
//! DELETE /api/admin/products/{id}           - Delete product
//! GET  /api/admin/orders                    - List orders, newest first
//! GET  /api/admin/orders/{id}               - Order detail
//! PUT  /api/admin/orders/{id}               - Update order
//! GET  /api/admin/blog-posts                - List posts, drafts included
//! POST /api/admin/blog-posts                - Create post
//! GET  /api/admin/blog-posts/{id}           - Post detail
//! PUT  /api/admin/blog-posts/{id}           - Update post
//! DELETE /api/admin/blog-posts/{id}         - Delete post
//! GET  /api/admin/custom-bag-requests       - List (fails open)
//! PUT  /api/admin/custom-bag-requests/{id}/status
//! GET  /api/admin/repair-requests           - List (fails open)
//! PUT  /api/admin/repair-requests/{id}/status
//! POST /api/admin/upload                    - Multipart image upload
//! ```

pub mod admin;
pub mod blog_posts;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the public catalog and checkout router.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/blog-posts", get(blog_posts::index))
        .route("/blog-posts/{id}", get(blog_posts::show))
        // Checkout
        .route("/orders", post(orders::create))
        .route("/payments/initialize", post(payments::initialize))
        .route("/payments/verify", get(payments::verify))
        // Support requests
        .route("/custom-bag-requests", post(support::create_custom_bag_request))
        .route("/repair-requests", post(support::create_repair_request))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/admin", admin::admin_routes())
        .nest("/api", storefront_routes())
}
