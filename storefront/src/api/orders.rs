//! Customer order lookup (success page)

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderDetail;

use super::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// GET /api/orders/by-session?session_id=
pub async fn by_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<OrderDetail> {
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::SessionIdRequired))?;

    let detail = state
        .store
        .find_order_by_session(session_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(detail))
}
