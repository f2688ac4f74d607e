//! PATCH /admin/api/orders/{id}/status

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};

use super::parse_body;
use crate::api::ApiResult;
use crate::services::admin::{StatusChange, StatusInput, parse_status_change};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<StatusResponse> {
    let input: StatusInput = parse_body(&body)?;
    let change = parse_status_change(&input)?;

    let (updated, kind, status) = match change {
        StatusChange::Payment(s) => (
            state.store.set_payment_status(&id, s).await?,
            "payment",
            s.as_db(),
        ),
        StatusChange::Fulfillment(s) => (
            state.store.set_fulfillment_status(&id, s).await?,
            "fulfillment",
            s.as_db(),
        ),
    };
    if updated.is_none() {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    }

    tracing::info!(order_id = %id, kind, status, "Order status updated by admin");
    Ok(Json(StatusResponse {
        ok: true,
        kind,
        status,
    }))
}
