//! Test harness: in-memory store, scripted Stripe, recording mailer

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use serde_json::{Value, json};
use shared::models::Product;
use tower::ServiceExt;

use storefront::auth::AdminCredentials;
use storefront::create_router;
use storefront::db::{MemoryStore, OrderStore};
use storefront::email::{EmailMessage, MailError, Mailer};
use storefront::state::{AppState, CheckoutSettings};
use storefront::stripe::{
    CheckoutSession, CheckoutSessionRequest, CreatedSession, GatewayError, LineItem,
    PaymentGateway, signature_header,
};

pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "hunter2";
pub const OPS_EMAIL: &str = "ops@shop.test";

/// Stripe stand-in: serves scripted sessions and records created ones
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, (CheckoutSession, Vec<LineItem>)>>,
    created: Mutex<Vec<CheckoutSessionRequest>>,
}

impl FakeGateway {
    pub fn script_session(&self, session: CheckoutSession, items: Vec<LineItem>) {
        self.sessions
            .lock()
            .insert(session.id.clone(), (session, items));
    }

    pub fn created(&self) -> Vec<CheckoutSessionRequest> {
        self.created.lock().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        let mut created = self.created.lock();
        created.push(request.clone());
        let id = format!("cs_test_{}", created.len());
        Ok(CreatedSession {
            url: format!("https://checkout.stripe.test/{id}"),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|(s, _)| s.clone())
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: format!("No such checkout session: {session_id}"),
            })
    }

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, GatewayError> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|(_, items)| items.clone())
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: format!("No such checkout session: {session_id}"),
            })
    }
}

/// Records delivered mail; can be switched to reject every send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
    rejected: AtomicUsize,
}

impl RecordingMailer {
    /// Successfully delivered messages
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(MailError::Send(format!("mailbox {} unavailable", message.to)));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_store(store.clone(), store)
    }

    /// Build with `order_store` in front of `store` (for wrapping stores)
    pub fn with_store(store: Arc<MemoryStore>, order_store: Arc<dyn OrderStore>) -> Self {
        let gateway = Arc::new(FakeGateway::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            store: order_store,
            payments: gateway.clone(),
            mailer: mailer.clone(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            admin: AdminCredentials {
                user: ADMIN_USER.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            },
            checkout: CheckoutSettings {
                site_url: Some("https://shop.test".to_string()),
                shipping_countries: vec!["LT".to_string()],
                shipping_rate_id: None,
            },
            admin_email: Some(OPS_EMAIL.to_string()),
        };
        Self {
            state,
            store,
            gateway,
            mailer,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn seed_product(&self, id: &str, price_cents: i64, stock: (i32, i32, i32)) {
        self.store.upsert_product(Product {
            id: id.to_string(),
            name: format!("Tee {id}"),
            description: None,
            image_url: None,
            price_cents,
            currency: "EUR".to_string(),
            active: true,
            stock_s: stock.0,
            stock_m: stock.1,
            stock_l: stock.2,
            created_at: 1,
        });
    }

    pub async fn product(&self, id: &str) -> Product {
        self.store
            .find_product(id)
            .await
            .unwrap()
            .expect("product seeded")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Deliver a correctly signed webhook
    pub async fn deliver(&self, event: &Value) -> (StatusCode, Value) {
        let payload = serde_json::to_vec(event).unwrap();
        let header = signature_header(&payload, WEBHOOK_SECRET, now_secs()).unwrap();
        self.send(
            Request::post("/api/webhook")
                .header("stripe-signature", header)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
    }
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

pub fn admin_request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", basic_auth(ADMIN_USER, ADMIN_PASSWORD))
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap()
}

/// One purchased line: (product id, size, quantity, unit price)
pub type Line<'a> = (&'a str, &'a str, i64, i64);

/// Scripted paid session with totals derived from `lines`
pub fn paid_session(id: &str, payment_intent: &str, lines: &[Line]) -> (CheckoutSession, Vec<LineItem>) {
    session_with_status(id, payment_intent, "paid", lines)
}

pub fn session_with_status(
    id: &str,
    payment_intent: &str,
    payment_status: &str,
    lines: &[Line],
) -> (CheckoutSession, Vec<LineItem>) {
    let subtotal: i64 = lines.iter().map(|(_, _, q, p)| q * p).sum();
    let session = serde_json::from_value(json!({
        "id": id,
        "payment_status": payment_status,
        "payment_intent": payment_intent,
        "currency": "eur",
        "amount_subtotal": subtotal,
        "amount_total": subtotal + 500,
        "total_details": {"amount_shipping": 500},
        "customer_details": {"email": "buyer@example.com", "name": "Ada Buyer"},
        "collected_information": {
            "shipping_details": {
                "name": "Ada Buyer",
                "address": {
                    "line1": "Gedimino pr. 1",
                    "city": "Vilnius",
                    "postal_code": "01103",
                    "country": "LT"
                }
            }
        }
    }))
    .unwrap();

    let items = lines
        .iter()
        .enumerate()
        .map(|(i, (product_id, size, quantity, price))| {
            serde_json::from_value(json!({
                "id": format!("li_{id}_{i}"),
                "description": format!("Tee {product_id} ({size})"),
                "quantity": quantity,
                "price": {
                    "id": format!("price_{i}"),
                    "unit_amount": price,
                    "product": {
                        "id": format!("prod_{i}"),
                        "name": format!("Tee {product_id}"),
                        "metadata": {"productId": product_id, "size": size}
                    }
                }
            }))
            .unwrap()
        })
        .collect();

    (session, items)
}

pub fn session_event(event_id: &str, event_type: &str, session_id: &str) -> Value {
    json!({
        "id": event_id,
        "type": event_type,
        "data": {"object": {"id": session_id, "object": "checkout.session"}}
    })
}

pub fn refund_event(event_id: &str, payment_intent: &str, refunded: bool) -> Value {
    json!({
        "id": event_id,
        "type": "charge.refunded",
        "data": {"object": {
            "id": "ch_1",
            "object": "charge",
            "payment_intent": payment_intent,
            "refunded": refunded
        }}
    })
}
