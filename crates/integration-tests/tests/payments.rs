//! Payment initialize and verify against a mocked gateway.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use bagworks_integration_tests::{GATEWAY_SECRET, TestContext};
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_initialize_converts_to_minor_units() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(header("authorization", format!("Bearer {GATEWAY_SECRET}").as_str()))
        .and(body_partial_json(json!({"email": "buyer@example.com", "amount": 1050})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {"reference": "ref_1", "authorization_url": "https://checkout.test/ref_1"}
        })))
        .expect(1)
        .mount(&ctx.gateway)
        .await;

    let response = ctx
        .post(
            "/api/payments/initialize",
            json!({"email": "buyer@example.com", "amount": 10.5, "metadata": {"orderId": "ORD-1"}}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["reference"], "ref_1");
}

#[tokio::test]
async fn test_initialize_accepts_numeric_string_amount() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(body_partial_json(json!({"amount": 2500000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true, "data": {}})))
        .expect(1)
        .mount(&ctx.gateway)
        .await;

    let response = ctx
        .post(
            "/api/payments/initialize",
            json!({"email": "buyer@example.com", "amount": "25000"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_initialize_rejects_bad_input_without_calling_gateway() {
    let ctx = TestContext::new().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.gateway)
        .await;

    let cases = [
        json!({"amount": 100}),
        json!({"email": "not-an-email", "amount": 100}),
        json!({"email": "buyer@example.com"}),
        json!({"email": "buyer@example.com", "amount": null}),
        json!({"email": "buyer@example.com", "amount": "abc"}),
        json!({"email": "buyer@example.com", "amount": 0}),
        json!({"email": "buyer@example.com", "amount": -5}),
        json!({"email": "buyer@example.com", "amount": 0.001}),
    ];

    for body in cases {
        let response = ctx.post("/api/payments/initialize", body.clone()).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(response.json["error"].is_string(), "body: {body}");
    }
}

#[tokio::test]
async fn test_initialize_relays_gateway_client_error() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"status": false, "message": "Invalid key"})),
        )
        .mount(&ctx.gateway)
        .await;

    let response = ctx
        .post(
            "/api/payments/initialize",
            json!({"email": "buyer@example.com", "amount": 100}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json, json!({"error": "Invalid key"}));
}

#[tokio::test]
async fn test_initialize_gateway_server_error_is_bad_request() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&ctx.gateway)
        .await;

    let response = ctx
        .post(
            "/api/payments/initialize",
            json!({"email": "buyer@example.com", "amount": 100}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json, json!({"error": "Payment gateway error"}));
}

#[tokio::test]
async fn test_verify_requires_reference() {
    let ctx = TestContext::new().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.gateway)
        .await;

    for uri in ["/api/payments/verify", "/api/payments/verify?reference=%20"] {
        let response = ctx.get(uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json, json!({"error": "Reference is required"}));
    }
}

#[tokio::test]
async fn test_verify_returns_gateway_payload() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/ref_1"))
        .and(header("authorization", format!("Bearer {GATEWAY_SECRET}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": {"status": "success", "amount": 1050}
        })))
        .expect(1)
        .mount(&ctx.gateway)
        .await;

    let response = ctx.get("/api/payments/verify?reference=ref_1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["amount"], 1050);
}

#[tokio::test]
async fn test_verify_failure_statuses() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": false, "message": "Transaction reference not found"})),
        )
        .mount(&ctx.gateway)
        .await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/declined"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": false, "message": "Declined"})),
        )
        .mount(&ctx.gateway)
        .await;

    let response = ctx.get("/api/payments/verify?reference=missing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json, json!({"error": "Transaction reference not found"}));

    let response = ctx.get("/api/payments/verify?reference=declined").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json, json!({"error": "Declined"}));
}
