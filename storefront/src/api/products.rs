//! Public catalog endpoints

use axum::Json;
use axum::extract::{Path, State};
use shared::error::{AppError, ErrorCode};
use shared::models::Product;

use super::ApiResult;
use crate::state::AppState;

/// GET /api/products - active products, newest first
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = state.store.list_active_products().await?;
    Ok(Json(products))
}

/// GET /api/products/{id} - inactive products are hidden
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    match state.store.find_product(&id).await? {
        Some(product) if product.active => Ok(Json(product)),
        _ => Err(AppError::new(ErrorCode::ProductNotFound)
            .with_detail("product_id", id)
            .into()),
    }
}
