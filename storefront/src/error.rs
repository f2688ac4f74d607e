//! Unified service-layer error type for the storefront
//!
//! `ServiceError` bridges store/provider errors and the API-layer error
//! (`AppError`), so handlers can use `?` without per-call logging boilerplate.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;
use crate::stripe::GatewayError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to DatabaseError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownProduct(id) => ServiceError::App(
                AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id),
            ),
            StoreError::StockUnderflow {
                product_id, size, ..
            } => ServiceError::App(
                AppError::new(ErrorCode::ProductOutOfStock)
                    .with_detail("product_id", product_id)
                    .with_detail("size", size.as_str()),
            ),
            other => ServiceError::Db(other.into()),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(e: GatewayError) -> Self {
        tracing::error!(error = %e, "Payment provider error");
        ServiceError::App(AppError::new(ErrorCode::PaymentProviderError))
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use shared::models::Size;

    #[test]
    fn test_store_errors_map_to_codes() {
        let app: AppError = ServiceError::from(StoreError::StockUnderflow {
            product_id: "p1".into(),
            size: Size::M,
            requested: 3,
        })
        .into();
        assert_eq!(app.code, ErrorCode::ProductOutOfStock);

        let app: AppError = ServiceError::from(StoreError::InvalidRow("x".into())).into();
        assert_eq!(app.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_gateway_error_is_bad_gateway() {
        let app: AppError = ServiceError::from(GatewayError::MissingField("url")).into();
        assert_eq!(app.http_status(), StatusCode::BAD_GATEWAY);
    }
}
