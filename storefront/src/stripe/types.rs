//! Subset of Stripe API objects used by checkout and reconciliation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field that is an id unless expanded with `expand[]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

pub trait HasId {
    fn id(&self) -> &str;
}

impl<T: HasId> Expandable<T> {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(obj) => obj.id(),
        }
    }

    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(obj) => Some(obj),
        }
    }
}

/// Webhook event envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: Option<String>,
    pub address: Option<Address>,
}

/// Newer API versions move shipping details here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedInformation {
    pub shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalDetails {
    pub amount_shipping: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
}

impl HasId for PaymentIntent {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`
    pub payment_status: Option<String>,
    pub payment_intent: Option<Expandable<PaymentIntent>>,
    pub currency: Option<String>,
    pub amount_subtotal: Option<i64>,
    pub amount_total: Option<i64>,
    pub total_details: Option<TotalDetails>,
    pub customer_details: Option<CustomerDetails>,
    pub shipping_details: Option<ShippingDetails>,
    pub collected_information: Option<CollectedInformation>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn shipping(&self) -> Option<&ShippingDetails> {
        self.collected_information
            .as_ref()
            .and_then(|c| c.shipping_details.as_ref())
            .or(self.shipping_details.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeProduct {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl HasId for StripeProduct {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub product: Option<Expandable<StripeProduct>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Price>,
}

impl LineItem {
    /// Metadata value from the expanded product, falling back to the price
    pub fn metadata(&self, key: &str) -> Option<&str> {
        let price = self.price.as_ref()?;
        price
            .product
            .as_ref()
            .and_then(|p| p.as_object())
            .and_then(|p| p.metadata.get(key))
            .or_else(|| price.metadata.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    pub payment_intent: Option<Expandable<PaymentIntent>>,
    #[serde(default)]
    pub refunded: bool,
}
