//! Admin surface and customer order lookup

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;

/// Place a paid order through the webhook; returns its id
async fn place_order(app: &TestApp, session_id: &str) -> String {
    let (session, items) = paid_session(session_id, &format!("pi_{session_id}"), &[("p1", "M", 1, 5000)]);
    app.gateway.script_session(session, items);
    let (status, body) = app
        .deliver(&session_event(
            &format!("evt_{session_id}"),
            "checkout.session.completed",
            session_id,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    body["orderId"].as_str().unwrap().to_string()
}

fn setup() -> TestApp {
    let app = TestApp::new();
    app.seed_product("p1", 5000, (10, 10, 10));
    app
}

#[tokio::test]
async fn test_admin_requires_basic_auth() {
    let app = setup();

    let response = tower::ServiceExt::oneshot(
        app.router(),
        Request::get("/admin/api/orders").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Basic realm=\"Admin\""
    );

    let (status, body) = app
        .send(
            Request::get("/admin/api/orders")
                .header("authorization", basic_auth(ADMIN_USER, "wrong"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, _) = app.send(admin_request("GET", "/admin/api/orders", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_and_filter_orders() {
    let app = setup();
    let first = place_order(&app, "cs_1").await;
    place_order(&app, "cs_2").await;

    let (status, body) = app.send(admin_request("GET", "/admin/api/orders", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(admin_request(
            "PATCH",
            &format!("/admin/api/orders/{first}/status"),
            Some(&json!({"type": "fulfillment", "status": "fulfilled"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(admin_request(
            "GET",
            "/admin/api/orders?fulfillment_status=fulfilled",
            None,
        ))
        .await;
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], first.as_str());

    let (status, body) = app
        .send(admin_request("GET", "/admin/api/orders?payment_status=lost", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .send(admin_request("GET", &format!("/admin/api/orders/{first}"), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(admin_request("GET", "/admin/api/orders/nope", None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_paging_bounds() {
    let app = setup();
    place_order(&app, "cs_1").await;
    place_order(&app, "cs_2").await;

    let (status, body) = app
        .send(admin_request("GET", "/admin/api/orders?page=2&per_page=1", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(admin_request(
            "GET",
            &format!("/admin/api/orders?page={}&per_page=100", i64::MAX),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app
        .send(admin_request(
            "GET",
            &format!("/admin/api/orders?page={}&per_page={}", i64::MIN, i64::MAX),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_status_editor_enforces_allow_lists() {
    let app = setup();
    let id = place_order(&app, "cs_1").await;
    let uri = format!("/admin/api/orders/{id}/status");

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            &uri,
            Some(&json!({"type": "payment", "status": "shipped"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            &uri,
            Some(&json!({"type": "delivery", "status": "shipped"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            &uri,
            Some(&json!({"type": "payment", "status": "Refunded"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "type": "payment", "status": "refunded"}));

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            "/admin/api/orders/missing/status",
            Some(&json!({"type": "payment", "status": "paid"})),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_shipping_editor() {
    let app = setup();
    let id = place_order(&app, "cs_1").await;
    let uri = format!("/admin/api/orders/{id}/shipping");

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            &uri,
            Some(&json!({"shippingCarrier": "DPD", "trackingNumber": "  ", "markShipped": true})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            &uri,
            Some(&json!({"shippingCarrier": " DPD ", "trackingNumber": "LT123"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shippingCarrier"], "DPD");
    assert_eq!(body["shippedAt"], serde_json::Value::Null);
    assert_eq!(body["fulfillmentStatus"], "unfulfilled");

    let (status, body) = app
        .send(admin_request(
            "PATCH",
            &uri,
            Some(&json!({"shippingCarrier": "DPD", "trackingNumber": "LT123", "markShipped": true})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["trackingNumber"], "LT123");
    assert!(body["shippedAt"].is_i64());
    assert_eq!(body["fulfillmentStatus"], "shipped");
}

#[tokio::test]
async fn test_order_lookup_by_session() {
    let app = setup();
    let id = place_order(&app, "cs_1").await;

    let (status, body) = app
        .send(
            Request::get("/api/orders/by-session?session_id=cs_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["paymentStatus"], "paid");
    assert_eq!(body["items"][0]["size"], "M");

    let (status, body) = app
        .send(Request::get("/api/orders/by-session").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4005);

    let (status, body) = app
        .send(
            Request::get("/api/orders/by-session?session_id=cs_nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}
