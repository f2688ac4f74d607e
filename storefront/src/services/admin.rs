//! Admin status and shipping editors
//!
//! Pure validation against the status allow-lists; no transition rules
//! beyond them.

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{FulfillmentStatus, PaymentStatus};

use crate::db::ShippingUpdate;

/// Validated status edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Payment(PaymentStatus),
    Fulfillment(FulfillmentStatus),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInput {
    pub shipping_carrier: Option<String>,
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub mark_shipped: bool,
}

/// Check `{type, status}` against the allow-list of its axis (case-insensitive)
pub fn parse_status_change(input: &StatusInput) -> Result<StatusChange, AppError> {
    let kind = input
        .kind
        .as_deref()
        .map(|k| k.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let status = input
        .status
        .as_deref()
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match kind.as_str() {
        "payment" => PaymentStatus::from_db(&status)
            .map(StatusChange::Payment)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderStatusInvalid,
                    "Invalid status. Allowed: pending, paid, failed, refunded",
                )
            }),
        "fulfillment" => FulfillmentStatus::from_db(&status)
            .map(StatusChange::Fulfillment)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderStatusInvalid,
                    "Invalid status. Allowed: unfulfilled, fulfilled, shipped, cancelled",
                )
            }),
        _ => Err(AppError::with_message(
            ErrorCode::OrderStatusTypeInvalid,
            "Invalid type. Allowed: payment, fulfillment",
        )),
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Trim inputs, blank to null; shipping requires a tracking number
pub fn shipping_update(input: &ShippingInput, now: i64) -> Result<ShippingUpdate, AppError> {
    let update = ShippingUpdate {
        shipping_carrier: clean(input.shipping_carrier.as_deref()),
        tracking_number: clean(input.tracking_number.as_deref()),
        shipped_at: input.mark_shipped.then_some(now),
    };
    if input.mark_shipped && update.tracking_number.is_none() {
        return Err(AppError::new(ErrorCode::TrackingNumberRequired));
    }
    Ok(update)
}
