//! API routes for the storefront

pub mod admin;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod stripe_webhook;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: JSON body or a coded error response
pub type ApiResult<T> = Result<axum::Json<T>, ServiceError>;

/// Webhook and checkout payloads are small
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public storefront
    let public = Router::new()
        .route("/api/products", get(products::list_products))
        .route("/api/products/{id}", get(products::get_product))
        .route("/api/checkout", post(checkout::create_checkout))
        .route("/api/orders/by-session", get(orders::by_session));

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/api/webhook", post(stripe_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .merge(webhook)
        .merge(admin::router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
