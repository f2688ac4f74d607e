//! Checkout initiation and catalog endpoints

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;
use shared::models::{Product, Size};

#[tokio::test]
async fn test_checkout_prices_from_catalog() {
    let app = TestApp::new();
    app.seed_product("p1", 5000, (0, 5, 0));

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/checkout",
            &json!({"items": [
                {"id": "p1", "quantity": 1, "size": "M", "price": 1, "name": "free"},
                {"id": "p1", "quantity": 1, "size": "M"}
            ]}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://checkout.stripe.test/cs_test_1");

    let created = app.gateway.created();
    assert_eq!(created.len(), 1);
    let request = &created[0];
    assert_eq!(request.currency, "eur");
    assert_eq!(request.lines.len(), 1);
    assert_eq!(request.lines[0].unit_amount, 5000);
    assert_eq!(request.lines[0].quantity, 2);
    assert_eq!(request.lines[0].size, Size::M);
    assert_eq!(request.lines[0].name, "Tee p1 (M)");
    assert!(request.success_url.starts_with("https://shop.test/checkout/success"));
    assert_eq!(request.shipping_countries, vec!["LT".to_string()]);
}

#[tokio::test]
async fn test_checkout_rejects_insufficient_stock() {
    let app = TestApp::new();
    app.seed_product("p1", 5000, (0, 5, 0));

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/checkout",
            &json!({"items": [{"id": "p1", "quantity": 6, "size": "M"}]}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6003);
    assert_eq!(body["details"]["available"], 5);
    assert!(app.gateway.created().is_empty());
}

#[tokio::test]
async fn test_checkout_validation_errors() {
    let app = TestApp::new();
    app.seed_product("p1", 5000, (1, 1, 1));
    app.store.upsert_product(Product {
        id: "retired".into(),
        active: false,
        ..app.product("p1").await
    });

    let cases = [
        (json!({"items": []}), 6101),
        (json!({"items": [{"id": "p1", "quantity": 0, "size": "M"}]}), 6103),
        (json!({"items": [{"id": "p1", "quantity": 1, "size": "XXL"}]}), 6104),
        (json!({"items": [{"id": "p1", "quantity": 1}]}), 6104),
        (json!({"items": [{"id": "ghost", "quantity": 1, "size": "M"}]}), 6002),
        (json!({"items": [{"id": "retired", "quantity": 1, "size": "M"}]}), 6002),
    ];
    for (body, code) in cases {
        let (status, response) = app.send(json_request("POST", "/api/checkout", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["code"], code, "{body}");
    }
    assert!(app.gateway.created().is_empty());
}

#[tokio::test]
async fn test_checkout_malformed_body() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Request::post("/api/checkout")
                .header("content-type", "application/json")
                .body(Body::from("{\"items\": 3"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_product_endpoints_hide_inactive() {
    let app = TestApp::new();
    app.seed_product("p1", 5000, (1, 2, 3));
    app.seed_product("p2", 3000, (0, 0, 0));
    app.store.upsert_product(Product {
        active: false,
        ..app.product("p2").await
    });

    let (status, body) = app
        .send(Request::get("/api/products").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["p1"]);

    let (status, body) = app
        .send(Request::get("/api/products/p1").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priceCents"], 5000);

    let (status, body) = app
        .send(Request::get("/api/products/p2").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
