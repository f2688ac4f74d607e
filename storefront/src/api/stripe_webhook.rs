//! Stripe webhook handler
//!
//! POST /api/webhook - raw body is required for signature verification.
//! Non-2xx responses make Stripe redeliver, so only failures a retry
//! could fix are answered with 500.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::services::reconcile::{self, WebhookOutcome};
use crate::state::AppState;

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let sig_header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    match reconcile::handle_webhook(&state, &body, sig_header).await {
        Ok(outcome) => Json(outcome_body(&outcome)).into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_client_error() {
                tracing::warn!(error = %e, "Webhook rejected");
            } else {
                tracing::error!(error = %e, "Webhook processing failed");
            }
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

fn outcome_body(outcome: &WebhookOutcome) -> serde_json::Value {
    match outcome {
        WebhookOutcome::Applied { order_id, created } => {
            json!({ "ok": true, "orderId": order_id, "created": created })
        }
        WebhookOutcome::Deduped => json!({ "ok": true, "deduped": true }),
        WebhookOutcome::StatusUpdated { matched } => json!({ "ok": true, "matched": matched }),
        WebhookOutcome::Ignored => json!({ "ok": true, "ignored": true }),
    }
}
