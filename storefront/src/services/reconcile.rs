//! Webhook reconciliation
//!
//! Turns a signed Stripe event into a durable order. Completion events
//! resolve the full session from the gateway and hand one
//! [`SessionRecord`] to the store, which upserts the order, replaces its
//! items and applies the stock decrement in one transaction.
//!
//! Idempotency has three layers:
//! 1. lookup of the event id before any work,
//! 2. the guarded upsert (`AlreadyApplied` when a concurrent delivery won),
//! 3. a retry on uniqueness conflicts that re-runs the lookup.

use http::StatusCode;
use shared::models::{PaymentStatus, Size};

use crate::db::{ApplyOutcome, Customer, ResolvedLine, SessionRecord, StoreError};
use crate::services::notify;
use crate::state::AppState;
use crate::stripe::types::{Address, Charge, CheckoutSession, Event, LineItem};
use crate::stripe::{GatewayError, SignatureError, verify_webhook_signature};

/// Attempts for one event when the store reports a uniqueness conflict
pub const MAX_ATTEMPTS: u32 = 3;

pub const SESSION_COMPLETED: &str = "checkout.session.completed";
pub const ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";
pub const ASYNC_PAYMENT_FAILED: &str = "checkout.session.async_payment_failed";
pub const SESSION_EXPIRED: &str = "checkout.session.expired";
pub const CHARGE_REFUNDED: &str = "charge.refunded";

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("missing Stripe-Signature header")]
    MissingSignature,
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("invalid webhook payload: {0}")]
    Payload(String),
    /// Line item cannot be mapped to a catalog product and size
    #[error("unresolvable line item: {0}")]
    LineItem(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// 400 for what a retry cannot fix, 500 so Stripe retries the rest
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReconcileError::MissingSignature
            | ReconcileError::Signature(_)
            | ReconcileError::Payload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied { order_id: String, created: bool },
    /// Event already processed
    Deduped,
    /// Secondary transition; `matched` is false when no order was found
    StatusUpdated { matched: bool },
    Ignored,
}

/// Verify, parse and apply one webhook delivery
pub async fn handle_webhook(
    state: &AppState,
    payload: &[u8],
    sig_header: Option<&str>,
) -> Result<WebhookOutcome, ReconcileError> {
    let sig_header = sig_header.ok_or(ReconcileError::MissingSignature)?;
    verify_webhook_signature(payload, sig_header, &state.webhook_secret)?;

    let event: Event = serde_json::from_slice(payload)
        .map_err(|e| ReconcileError::Payload(e.to_string()))?;
    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Received Stripe webhook");

    handle_event(state, &event).await
}

/// Apply an authenticated event
pub async fn handle_event(
    state: &AppState,
    event: &Event,
) -> Result<WebhookOutcome, ReconcileError> {
    if let Some(order_id) = state.store.order_id_for_event(&event.id).await? {
        tracing::info!(
            event_id = %event.id,
            order_id = %order_id,
            "Duplicate webhook event, skipping"
        );
        return Ok(WebhookOutcome::Deduped);
    }

    match event.event_type.as_str() {
        SESSION_COMPLETED | ASYNC_PAYMENT_SUCCEEDED => apply_completed(state, event).await,
        ASYNC_PAYMENT_FAILED | SESSION_EXPIRED => {
            let session_id = object_id(event)?;
            let matched = state
                .store
                .mark_session_failed(&session_id, &event.id)
                .await?;
            tracing::info!(
                session_id = %session_id,
                matched,
                event_type = %event.event_type,
                "Payment marked failed"
            );
            Ok(WebhookOutcome::StatusUpdated { matched })
        }
        CHARGE_REFUNDED => apply_refund(state, event).await,
        other => {
            tracing::debug!(event_type = other, "Unhandled webhook event type");
            Ok(WebhookOutcome::Ignored)
        }
    }
}

fn object_id(event: &Event) -> Result<String, ReconcileError> {
    event.data.object["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| ReconcileError::Payload("event object has no id".into()))
}

async fn apply_completed(
    state: &AppState,
    event: &Event,
) -> Result<WebhookOutcome, ReconcileError> {
    let session_id = object_id(event)?;

    let session = state.payments.retrieve_session(&session_id).await?;
    let items = state.payments.list_line_items(&session_id).await?;
    let record = resolve_session(&event.id, &session, &items).inspect_err(|e| {
        tracing::error!(session_id = %session_id, error = %e, "Session could not be resolved");
    })?;

    let mut attempt = 1;
    let outcome = loop {
        match state.store.apply_session(&record).await {
            Err(StoreError::Conflict(msg)) if attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    session_id = %session_id,
                    attempt,
                    %msg,
                    "Order write conflicted, retrying"
                );
                attempt += 1;
                if state.store.order_id_for_event(&event.id).await?.is_some() {
                    return Ok(WebhookOutcome::Deduped);
                }
            }
            Err(StoreError::StockUnderflow {
                product_id,
                size,
                requested,
            }) => {
                tracing::error!(
                    session_id = %session_id,
                    product_id = %product_id,
                    size = %size,
                    requested,
                    "Reconciliation aborted: insufficient stock"
                );
                return Err(StoreError::StockUnderflow {
                    product_id,
                    size,
                    requested,
                }
                .into());
            }
            Err(StoreError::UnknownProduct(product_id)) => {
                tracing::error!(
                    session_id = %session_id,
                    product_id = %product_id,
                    "Reconciliation aborted: unknown product"
                );
                return Err(StoreError::UnknownProduct(product_id).into());
            }
            other => break other?,
        }
    };

    match outcome {
        ApplyOutcome::AlreadyApplied { order_id } => {
            tracing::info!(
                session_id = %session_id,
                order_id = %order_id,
                "Event applied concurrently"
            );
            Ok(WebhookOutcome::Deduped)
        }
        ApplyOutcome::Applied {
            order_id,
            created,
            stock_applied,
        } => {
            tracing::info!(
                session_id = %session_id,
                order_id = %order_id,
                created,
                stock_applied,
                payment_status = %record.payment_status,
                "Order reconciled"
            );
            notify::order_committed(state, &order_id, stock_applied).await;
            Ok(WebhookOutcome::Applied { order_id, created })
        }
    }
}

async fn apply_refund(state: &AppState, event: &Event) -> Result<WebhookOutcome, ReconcileError> {
    let charge: Charge = serde_json::from_value(event.data.object.clone())
        .map_err(|e| ReconcileError::Payload(e.to_string()))?;

    if !charge.refunded {
        tracing::debug!(charge_id = %charge.id, "Partial refund, order unchanged");
        return Ok(WebhookOutcome::Ignored);
    }
    let Some(payment_id) = charge.payment_intent.as_ref().map(|pi| pi.id().to_string()) else {
        tracing::warn!(charge_id = %charge.id, "Refunded charge has no payment intent");
        return Ok(WebhookOutcome::Ignored);
    };

    let matched = state
        .store
        .mark_payment_refunded(&payment_id, &event.id)
        .await?;
    tracing::info!(payment_id = %payment_id, matched, "Payment marked refunded");
    Ok(WebhookOutcome::StatusUpdated { matched })
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Map session detail onto the canonical order record
pub fn resolve_session(
    event_id: &str,
    session: &CheckoutSession,
    items: &[LineItem],
) -> Result<SessionRecord, ReconcileError> {
    let details = session.customer_details.clone().unwrap_or_default();
    let shipping = session.shipping();
    let address: Address = shipping
        .and_then(|s| s.address.clone())
        .or(details.address)
        .unwrap_or_default();

    let customer = Customer {
        email: non_empty(details.email.as_ref()),
        name: non_empty(details.name.as_ref())
            .or_else(|| non_empty(shipping.and_then(|s| s.name.as_ref()))),
        phone: non_empty(details.phone.as_ref()),
        address_line1: non_empty(address.line1.as_ref()),
        address_line2: non_empty(address.line2.as_ref()),
        city: non_empty(address.city.as_ref()),
        region: non_empty(address.state.as_ref()),
        postal_code: non_empty(address.postal_code.as_ref()),
        country: non_empty(address.country.as_ref()),
    };

    let payment_status = match session.payment_status.as_deref() {
        Some("unpaid") => PaymentStatus::Pending,
        _ => PaymentStatus::Paid,
    };

    if items.is_empty() {
        return Err(ReconcileError::LineItem(format!(
            "session {} has no line items",
            session.id
        )));
    }
    let lines = items
        .iter()
        .map(resolve_line)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SessionRecord {
        session_id: session.id.clone(),
        event_id: event_id.to_string(),
        payment_id: session.payment_intent.as_ref().map(|pi| pi.id().to_string()),
        payment_status,
        customer,
        currency: session
            .currency
            .as_deref()
            .unwrap_or("eur")
            .to_ascii_uppercase(),
        subtotal_cents: session.amount_subtotal.unwrap_or(0),
        shipping_cents: session
            .total_details
            .as_ref()
            .and_then(|t| t.amount_shipping)
            .unwrap_or(0),
        total_cents: session.amount_total.unwrap_or(0),
        lines,
    })
}

fn resolve_line(item: &LineItem) -> Result<ResolvedLine, ReconcileError> {
    let product_id = item
        .metadata("productId")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ReconcileError::LineItem(format!("{} has no productId", item.id)))?;
    let size = item
        .metadata("size")
        .and_then(Size::parse)
        .ok_or_else(|| ReconcileError::LineItem(format!("{} has no valid size", item.id)))?;
    let quantity = item
        .quantity
        .unwrap_or(1)
        .try_into()
        .ok()
        .filter(|q: &i32| *q > 0)
        .ok_or_else(|| ReconcileError::LineItem(format!("{} has invalid quantity", item.id)))?;

    let price = item.price.as_ref();
    let name = item
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .or_else(|| {
            price
                .and_then(|p| p.product.as_ref())
                .and_then(|p| p.as_object())
                .and_then(|p| p.name.clone())
        })
        .unwrap_or_else(|| "Item".to_string());

    Ok(ResolvedLine {
        product_id: product_id.to_string(),
        size,
        quantity,
        unit_price_cents: price.and_then(|p| p.unit_amount).unwrap_or(0),
        name,
    })
}
