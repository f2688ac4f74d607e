//! PATCH /admin/api/orders/{id}/shipping

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::FulfillmentStatus;
use shared::util::now_millis;

use super::parse_body;
use crate::api::ApiResult;
use crate::services::admin::{ShippingInput, shipping_update};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingResponse {
    pub ok: bool,
    pub shipping_carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<i64>,
    pub fulfillment_status: FulfillmentStatus,
}

/// Set carrier and tracking; `markShipped` also stamps `shippedAt`
/// and moves fulfillment to shipped.
pub async fn update_shipping(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<ShippingResponse> {
    let input: ShippingInput = parse_body(&body)?;
    let update = shipping_update(&input, now_millis())?;

    let order = state
        .store
        .update_shipping(&id, &update)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    tracing::info!(
        order_id = %id,
        shipped = input.mark_shipped,
        "Order shipping updated by admin"
    );
    Ok(Json(ShippingResponse {
        ok: true,
        shipping_carrier: order.shipping_carrier,
        tracking_number: order.tracking_number,
        shipped_at: order.shipped_at,
        fulfillment_status: order.fulfillment_status,
    }))
}
