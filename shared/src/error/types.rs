//! `AppError` and its JSON body

use std::collections::BTreeMap;

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use super::category::ErrorCategory;
use super::codes::ErrorCode;

/// Coded error returned by every storefront handler.
///
/// Rendered as `{ code, message, details? }`. The shop frontend and the
/// admin panel switch on `code` and show `message` verbatim, so messages
/// are written for people ("Only 2 left of Tee in size M").
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    /// Context such as the offending product id, size or available stock
    pub details: Option<BTreeMap<String, Value>>,
}

/// Wire shape of an [`AppError`]
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: u16,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a BTreeMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_default()
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            code: self.code.code(),
            message: &self.message,
            details: self.details.as_ref(),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Malformed request body or query
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        } else if self.code.category() == ErrorCategory::Auth {
            tracing::warn!(code = %self.code, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_comes_from_code() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert_eq!(err.to_string(), "[4001] Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::with_message(ErrorCode::ProductOutOfStock, "Only 3 left")
            .with_detail("product_id", "p1")
            .with_detail("size", "M")
            .with_detail("available", 3);

        let details = err.details.as_ref().unwrap();
        assert_eq!(details["product_id"], "p1");
        assert_eq!(details["available"], 3);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_serialization() {
        let err = AppError::new(ErrorCode::CartEmpty);
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json, serde_json::json!({"code": 6101, "message": "Cart is empty"}));

        let err = err.with_detail("lines", 0);
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["details"]["lines"], 0);
    }

    #[test]
    fn test_auth_and_internal_constructors() {
        assert_eq!(
            AppError::invalid_credentials().http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::internal("no origin").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::invalid_request("bad json").code.code(), 5);
    }
}
