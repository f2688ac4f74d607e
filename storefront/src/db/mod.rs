//! Database access layer
//!
//! [`OrderStore`] is the seam between handlers and persistence. `PgStore`
//! backs production; `MemoryStore` backs tests and local demos.

pub mod memory;
pub mod orders;
pub mod pg;
pub mod products;

use async_trait::async_trait;
use shared::models::{
    FulfillmentStatus, Order, OrderDetail, PaymentStatus, Product, Size,
};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Errors raised by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Conditional decrement matched no row: stock < requested
    #[error("insufficient stock for product {product_id} size {size}: requested {requested}")]
    StockUnderflow {
        product_id: String,
        size: Size,
        requested: i32,
    },
    /// A line references a product that is not in the catalog
    #[error("product {0} does not exist")]
    UnknownProduct(String),
    /// Unique constraint violated (concurrent insert race)
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    /// Row holds a value the domain model does not accept
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error()
            && db_err.is_unique_violation()
        {
            return StoreError::Conflict(db_err.message().to_string());
        }
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Contact and address data resolved from the payment provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// One purchased line, snapshotted from the provider's session detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub product_id: String,
    pub size: Size,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub name: String,
}

impl SessionRecord {
    /// Lines sorted by `(product_id, size)`. Stock rows are locked in this
    /// order so concurrent orders over the same products cannot deadlock.
    pub fn lines_in_lock_order(&self) -> Vec<&ResolvedLine> {
        let mut lines: Vec<&ResolvedLine> = self.lines.iter().collect();
        lines.sort_by(|a, b| (a.product_id.as_str(), a.size).cmp(&(b.product_id.as_str(), b.size)));
        lines
    }
}

/// Canonical order representation of one checkout session at one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: String,
    pub event_id: String,
    pub payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub customer: Customer,
    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub lines: Vec<ResolvedLine>,
}

/// Result of writing a [`SessionRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Order, items (and stock, when claimed) committed
    Applied {
        order_id: String,
        created: bool,
        /// This write performed the order's one-time stock decrement
        stock_applied: bool,
    },
    /// A concurrent delivery of the same event already committed it
    AlreadyApplied { order_id: String },
}

/// Admin order list filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub payment_status: Option<PaymentStatus>,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Admin shipping update, already validated
#[derive(Debug, Clone, Default)]
pub struct ShippingUpdate {
    pub shipping_carrier: Option<String>,
    pub tracking_number: Option<String>,
    /// Some(now) sets fulfillment `shipped` and stamps `shipped_at`
    pub shipped_at: Option<i64>,
}

/// Persistence contract for catalog reads and the order lifecycle
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Active products, newest first
    async fn list_active_products(&self) -> StoreResult<Vec<Product>>;

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>>;

    /// Products for the given ids; missing ids are simply absent
    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>>;

    /// Id of the order whose last processed event is `event_id`
    async fn order_id_for_event(&self, event_id: &str) -> StoreResult<Option<String>>;

    /// Upsert the order, replace its items and apply the stock decrement,
    /// all in one transaction.
    async fn apply_session(&self, record: &SessionRecord) -> StoreResult<ApplyOutcome>;

    /// Mark the order for a session as failed. Returns false if no order exists.
    async fn mark_session_failed(&self, session_id: &str, event_id: &str) -> StoreResult<bool>;

    /// Mark the order paid by `payment_id` as refunded. Returns false if none matched.
    async fn mark_payment_refunded(&self, payment_id: &str, event_id: &str) -> StoreResult<bool>;

    /// Atomically set `confirmation_email_sent_at` if still unset
    async fn claim_confirmation_email(&self, order_id: &str, now: i64) -> StoreResult<bool>;

    /// Clear the confirmation marker after a failed send
    async fn release_confirmation_email(&self, order_id: &str) -> StoreResult<()>;

    async fn find_order(&self, id: &str) -> StoreResult<Option<OrderDetail>>;

    async fn find_order_by_session(&self, session_id: &str) -> StoreResult<Option<OrderDetail>>;

    /// Orders, newest first
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    async fn set_payment_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
    ) -> StoreResult<Option<Order>>;

    async fn set_fulfillment_status(
        &self,
        order_id: &str,
        status: FulfillmentStatus,
    ) -> StoreResult<Option<Order>>;

    async fn update_shipping(
        &self,
        order_id: &str,
        update: &ShippingUpdate,
    ) -> StoreResult<Option<Order>>;
}
