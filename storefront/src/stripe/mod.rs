//! Stripe integration via REST API (no SDK dependency)

mod client;
pub mod signature;
pub mod types;

use async_trait::async_trait;
use shared::models::Size;

pub use client::StripeGateway;
pub use signature::{SignatureError, signature_header, verify_webhook_signature};
pub use types::{CheckoutSession, LineItem};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("stripe request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("stripe returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("stripe response missing {0}")]
    MissingField(&'static str),
}

/// One hosted-checkout line, priced from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    pub product_id: String,
    pub size: Size,
    /// Display name, already suffixed with the size
    pub name: String,
    pub unit_amount: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Lower-case ISO code as Stripe expects
    pub currency: String,
    pub lines: Vec<SessionLine>,
    pub success_url: String,
    pub cancel_url: String,
    pub shipping_countries: Vec<String>,
    pub shipping_rate_id: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub id: String,
    pub url: String,
}

/// Hosted checkout provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CreatedSession, GatewayError>;

    /// Full session detail (customer, totals, payment intent)
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError>;

    /// All line items with `price.product` expanded
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, GatewayError>;
}
