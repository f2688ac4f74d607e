//! Post-commit order notifications
//!
//! Best effort: failures are logged and never reach the webhook response.

use shared::models::PaymentStatus;
use shared::util::now_millis;

use crate::email::templates;
use crate::state::AppState;

/// Send the customer confirmation (once per order) and, when this event
/// newly applied stock, the operator notice.
pub async fn order_committed(state: &AppState, order_id: &str, stock_applied: bool) {
    let detail = match state.store.find_order(order_id).await {
        Ok(Some(d)) => d,
        Ok(None) => {
            tracing::warn!(order_id, "Committed order not found for notification");
            return;
        }
        Err(e) => {
            tracing::error!(order_id, error = %e, "Failed to load order for notification");
            return;
        }
    };

    if detail.order.payment_status == PaymentStatus::Paid
        && let Some(to) = detail.order.email.as_deref()
    {
        send_confirmation(state, &detail, to).await;
    }

    if stock_applied && let Some(ops) = state.admin_email.as_deref() {
        let message = templates::operator_notice(&detail, ops);
        if let Err(e) = state.mailer.send(&message).await {
            tracing::error!(order_id, error = %e, "Operator notice failed");
        }
    }
}

async fn send_confirmation(state: &AppState, detail: &shared::models::OrderDetail, to: &str) {
    let order_id = detail.order.id.as_str();
    match state
        .store
        .claim_confirmation_email(order_id, now_millis())
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(order_id, "Confirmation already sent");
            return;
        }
        Err(e) => {
            tracing::error!(order_id, error = %e, "Failed to claim confirmation email");
            return;
        }
    }

    let message = templates::order_confirmation(detail, to);
    match state.mailer.send(&message).await {
        Ok(()) => tracing::info!(order_id, "Order confirmation sent"),
        Err(e) => {
            tracing::error!(order_id, error = %e, "Order confirmation failed");
            // Let a later event retry the send
            if let Err(e) = state.store.release_confirmation_email(order_id).await {
                tracing::error!(order_id, error = %e, "Failed to release confirmation claim");
            }
        }
    }
}
