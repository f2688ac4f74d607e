//! POST /api/checkout

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use shared::error::AppError;

use super::ApiResult;
use crate::services::checkout::{CheckoutRequest, site_origin, start_checkout};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Validate the cart and return the hosted checkout URL.
///
/// The body is parsed by hand so malformed JSON maps to a coded 400.
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<CheckoutResponse> {
    let request: CheckoutRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::invalid_request(format!("Invalid checkout body: {e}")))?;

    let origin = site_origin(&state.checkout, &headers);
    let url = start_checkout(&state, &request.items, origin).await?;
    Ok(Json(CheckoutResponse { url }))
}
