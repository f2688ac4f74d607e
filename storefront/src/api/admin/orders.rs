//! Admin order list and detail

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{FulfillmentStatus, Order, OrderDetail, PaymentStatus};

use crate::api::ApiResult;
use crate::db::OrderFilter;
use crate::state::AppState;

/// Deepest page the list accepts; keeps the offset within i64
const MAX_PAGE: i64 = 100_000;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub payment_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

fn status_filter<T>(
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    field: &'static str,
) -> Result<Option<T>, AppError> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() || v == "all" => Ok(None),
        Some(v) => parse(&v).map(Some).ok_or_else(|| {
            AppError::new(ErrorCode::OrderStatusInvalid)
                .with_detail("field", field)
                .with_detail("value", v)
        }),
    }
}

/// GET /admin/api/orders - newest first, optional status filters
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Order>> {
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let page = query.page.unwrap_or(1).clamp(1, MAX_PAGE);

    let filter = OrderFilter {
        payment_status: status_filter(
            query.payment_status.as_deref(),
            PaymentStatus::from_db,
            "payment_status",
        )?,
        fulfillment_status: status_filter(
            query.fulfillment_status.as_deref(),
            FulfillmentStatus::from_db,
            "fulfillment_status",
        )?,
        limit: per_page,
        offset: (page - 1) * per_page,
    };

    let orders = state.store.list_orders(&filter).await?;
    Ok(Json(orders))
}

/// GET /admin/api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OrderDetail> {
    let detail = state
        .store
        .find_order(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(detail))
}
