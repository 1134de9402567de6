//! Admin login, logout, and the session guard.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use bagworks_core::AdminRole;
use bagworks_integration_tests::{ADMIN_EMAIL, TestContext, session_cookie};
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_require_session() {
    let ctx = TestContext::new().await;

    for (method, uri) in [
        (Method::GET, "/api/admin/products"),
        (Method::GET, "/api/admin/orders"),
        (Method::GET, "/api/admin/blog-posts"),
        (Method::GET, "/api/admin/custom-bag-requests"),
        (Method::GET, "/api/admin/repair-requests"),
    ] {
        let response = ctx.send(method, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.json, json!({"error": "Unauthorized"}));
    }
}

#[tokio::test]
async fn test_unauthenticated_write_has_no_side_effect() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post("/api/admin/products", json!({"name": "Sneaky", "price": 10}))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.collection_file("products").is_none());

    // A cookie that was never issued is just as unauthenticated
    let response = ctx
        .send(
            Method::POST,
            "/api/admin/products",
            Some(json!({"name": "Sneaky", "price": 10})),
            Some("adminToken=forged-session-id"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.collection_file("products").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post(
            "/api/admin/login",
            json!({"email": ADMIN_EMAIL, "password": "not the password"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json, json!({"error": "Invalid credentials"}));
    assert!(session_cookie(&response.headers).is_none());

    let response = ctx
        .post(
            "/api/admin/login",
            json!({"email": "nobody@bagworks.test", "password": "whatever-password"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_session_and_logout() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/admin/session").await;
    assert_eq!(response.json, json!({"authenticated": false}));

    let response = ctx
        .post(
            "/api/admin/login",
            json!({"email": ADMIN_EMAIL, "password": bagworks_integration_tests::ADMIN_PASSWORD}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["success"], true);
    assert_eq!(response.json["admin"]["email"], ADMIN_EMAIL);
    assert_eq!(response.json["admin"]["role"], "super_admin");
    let set_cookie = response.headers["set-cookie"].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = session_cookie(&response.headers).unwrap();

    let response = ctx
        .send(Method::GET, "/api/admin/session", None, Some(&cookie))
        .await;
    assert_eq!(response.json["authenticated"], true);
    assert_eq!(response.json["admin"]["email"], ADMIN_EMAIL);

    let response = ctx
        .send(Method::GET, "/api/admin/products", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["cache-control"], "no-store, max-age=0");

    let response = ctx
        .send(Method::POST, "/api/admin/logout", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({"success": true}));

    // The old cookie is revoked server-side
    let response = ctx
        .send(Method::GET, "/api/admin/products", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_viewer_can_read_but_not_write() {
    let ctx = TestContext::new().await;
    ctx.create_admin("viewer@bagworks.test", AdminRole::Viewer, "viewer-password-42")
        .await;
    let cookie = ctx
        .login_as("viewer@bagworks.test", "viewer-password-42")
        .await;

    let response = ctx
        .send(Method::GET, "/api/admin/orders", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = ctx
        .send(
            Method::POST,
            "/api/admin/products",
            Some(json!({"name": "Tote", "price": 100})),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json, json!({"error": "Forbidden"}));
    assert!(ctx.collection_file("products").is_none());
}

#[tokio::test]
async fn test_removed_account_loses_access() {
    let ctx = TestContext::new().await;
    ctx.create_admin("staff@bagworks.test", AdminRole::Admin, "staff-password-42")
        .await;
    let cookie = ctx.login_as("staff@bagworks.test", "staff-password-42").await;

    let response = ctx
        .send(Method::GET, "/api/admin/products", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert!(ctx.state.auth().remove_account("staff@bagworks.test").await.unwrap());

    let response = ctx
        .send(Method::GET, "/api/admin/products", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let ctx = TestContext::new().await;
    let body = json!({"email": ADMIN_EMAIL, "password": "wrong-password"});

    for _ in 0..5 {
        let response = ctx.post("/api/admin/login", body.clone()).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = ctx.post("/api/admin/login", body).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}
