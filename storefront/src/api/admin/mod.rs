//! Admin API (HTTP Basic Auth)

pub mod orders;
pub mod shipping;
pub mod status;

use axum::body::Bytes;
use axum::routing::{get, patch};
use axum::{Router, middleware};
use serde::de::DeserializeOwned;
use shared::error::AppError;

use crate::auth::admin_auth_middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/api/orders", get(orders::list_orders))
        .route("/admin/api/orders/{id}", get(orders::get_order))
        .route("/admin/api/orders/{id}/status", patch(status::update_status))
        .route(
            "/admin/api/orders/{id}/shipping",
            patch(shipping::update_shipping),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

/// Parse a JSON body, mapping failures to a coded 400
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::invalid_request(format!("Invalid body: {e}")))
}
