//! Order Model
//!
//! Orders carry two independent status axes: payment and fulfillment.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::product::Size;

/// Payment axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Fulfillment axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Unfulfilled,
    Fulfilled,
    Shipped,
    Cancelled,
}

impl FulfillmentStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "unfulfilled" => Some(Self::Unfulfilled),
            "fulfilled" => Some(Self::Fulfilled),
            "shipped" => Some(Self::Shipped),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Unfulfilled => "unfulfilled",
            Self::Fulfilled => "fulfilled",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub stripe_session_id: String,
    pub stripe_payment_id: Option<String>,
    /// Idempotency guard: id of the last webhook event applied to this order
    pub last_stripe_event_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,

    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,

    pub shipping_carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<i64>,
    pub confirmation_email_sent_at: Option<i64>,
    /// Set once when this order's stock decrement has been applied
    pub stock_applied_at: Option<i64>,
    pub created_at: i64,
}

/// Order line with name/price snapshots taken at payment time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub size: Option<Size>,
}

impl OrderItem {
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * i64::from(self.quantity)
    }
}

/// Order with its items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for s in ["pending", "paid", "failed", "refunded"] {
            assert_eq!(PaymentStatus::from_db(s).unwrap().as_db(), s);
        }
        for s in ["unfulfilled", "fulfilled", "shipped", "cancelled"] {
            assert_eq!(FulfillmentStatus::from_db(s).unwrap().as_db(), s);
        }
        assert_eq!(PaymentStatus::from_db("shipped"), None);
        assert_eq!(FulfillmentStatus::from_db("paid"), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FulfillmentStatus::Unfulfilled).unwrap(),
            "\"unfulfilled\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            id: "i1".into(),
            order_id: "o1".into(),
            product_id: "p1".into(),
            name: "Tee (M)".into(),
            price_cents: 5000,
            quantity: 3,
            size: Some(Size::M),
        };
        assert_eq!(item.line_total_cents(), 15_000);
    }
}
