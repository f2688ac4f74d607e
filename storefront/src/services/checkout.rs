//! Checkout initiator
//!
//! Validates an untrusted cart against the catalog and opens a hosted
//! checkout session. Prices and names always come from the store.

use std::collections::HashMap;

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Product, Size};

use crate::error::ServiceResult;
use crate::state::{AppState, CheckoutSettings};
use crate::stripe::{CheckoutSessionRequest, SessionLine};

pub const MAX_LINE_QUANTITY: i64 = 20;
pub const MAX_CART_LINES: usize = 50;
const SESSION_SOURCE: &str = "storefront";

/// One client cart line. Any client-sent price or name is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineInput {
    #[serde(default)]
    pub id: String,
    pub quantity: i64,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLineInput>,
}

/// Cart line after validation and duplicate merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLine {
    pub product_id: String,
    pub size: Size,
    pub quantity: i32,
}

/// Validate lines and merge duplicates of (product, size) by summing.
/// Output keeps first-appearance order.
pub fn normalize_lines(items: &[CartLineInput]) -> Result<Vec<CanonicalLine>, AppError> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty));
    }
    if items.len() > MAX_CART_LINES {
        return Err(AppError::with_message(
            ErrorCode::CartTooLarge,
            format!("At most {MAX_CART_LINES} lines per order"),
        ));
    }

    let mut lines: Vec<CanonicalLine> = Vec::new();
    let mut index: HashMap<(String, Size), usize> = HashMap::new();

    for item in items {
        let product_id = item.id.trim();
        if product_id.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Each item needs a product id",
            ));
        }
        if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
            return Err(AppError::with_message(
                ErrorCode::InvalidQuantity,
                format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}"),
            )
            .with_detail("product_id", product_id));
        }
        let size = item
            .size
            .as_deref()
            .and_then(Size::parse)
            .ok_or_else(|| {
                AppError::with_message(ErrorCode::InvalidSize, "Size must be one of S, M, L")
                    .with_detail("product_id", product_id)
            })?;

        // Bounded by MAX_LINE_QUANTITY above
        let quantity = item.quantity as i32;
        match index.get(&(product_id.to_string(), size)) {
            Some(&i) => lines[i].quantity += quantity,
            None => {
                index.insert((product_id.to_string(), size), lines.len());
                lines.push(CanonicalLine {
                    product_id: product_id.to_string(),
                    size,
                    quantity,
                });
            }
        }
    }

    Ok(lines)
}

/// Price canonical lines from the catalog and check stock per size
pub fn build_session_request(
    lines: &[CanonicalLine],
    products: &[Product],
    settings: &CheckoutSettings,
    origin: &str,
) -> Result<CheckoutSessionRequest, AppError> {
    let catalog: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut currency: Option<&str> = None;
    let mut session_lines = Vec::with_capacity(lines.len());

    for line in lines {
        let product = catalog
            .get(line.product_id.as_str())
            .filter(|p| p.active)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductUnavailable,
                    format!("Product {} is not available", line.product_id),
                )
                .with_detail("product_id", line.product_id.clone())
            })?;

        let available = product.stock_for(line.size);
        if line.quantity > available {
            return Err(AppError::with_message(
                ErrorCode::ProductOutOfStock,
                format!(
                    "Only {available} left of {} in size {}",
                    product.name, line.size
                ),
            )
            .with_detail("product_id", product.id.clone())
            .with_detail("size", line.size.as_str())
            .with_detail("available", available));
        }

        match currency {
            None => currency = Some(product.currency.as_str()),
            Some(c) if c.eq_ignore_ascii_case(&product.currency) => {}
            Some(_) => return Err(AppError::new(ErrorCode::MixedCurrency)),
        }

        session_lines.push(SessionLine {
            product_id: product.id.clone(),
            size: line.size,
            name: format!("{} ({})", product.name, line.size),
            unit_amount: product.price_cents,
            quantity: line.quantity,
        });
    }

    Ok(CheckoutSessionRequest {
        currency: currency.unwrap_or("eur").to_ascii_lowercase(),
        lines: session_lines,
        success_url: format!("{origin}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{origin}/checkout/cancel"),
        shipping_countries: settings.shipping_countries.clone(),
        shipping_rate_id: settings.shipping_rate_id.clone(),
        source: SESSION_SOURCE.to_string(),
    })
}

/// Public origin: configured site URL, else forwarded/host headers
pub fn site_origin(settings: &CheckoutSettings, headers: &http::HeaderMap) -> Option<String> {
    if let Some(site) = &settings.site_url {
        return Some(site.trim_end_matches('/').to_string());
    }
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let proto = header("x-forwarded-proto").unwrap_or("https");
    let host = header("x-forwarded-host").or_else(|| header("host"))?;
    Some(format!("{proto}://{host}"))
}

/// Validate the cart and open a hosted session; returns the redirect URL
pub async fn start_checkout(
    state: &AppState,
    items: &[CartLineInput],
    origin: Option<String>,
) -> ServiceResult<String> {
    let Some(origin) = origin else {
        return Err(AppError::internal("Could not determine site origin").into());
    };

    let lines = normalize_lines(items)?;
    let ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
    let products = state.store.find_products(&ids).await?;
    let request = build_session_request(&lines, &products, &state.checkout, &origin)?;

    let session = state.payments.create_checkout_session(&request).await?;
    tracing::info!(
        session_id = %session.id,
        lines = request.lines.len(),
        "Checkout session created"
    );
    Ok(session.url)
}
