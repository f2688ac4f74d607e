//! Order and order item queries
//!
//! Write functions take a `PgConnection` so they compose inside the
//! reconciliation transaction; reads and admin edits take the pool.

use shared::models::{FulfillmentStatus, Order, OrderItem, PaymentStatus, Size};
use sqlx::{PgConnection, PgPool};

use super::{OrderFilter, ResolvedLine, SessionRecord, ShippingUpdate, StoreError};

#[derive(sqlx::FromRow)]
pub struct OrderRow {
    pub id: String,
    pub stripe_session_id: String,
    pub stripe_payment_id: Option<String>,
    pub last_stripe_event_id: Option<String>,
    pub payment_status: String,
    pub fulfillment_status: String,
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
    pub stock_applied_at: Option<i64>,
    pub created_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_status = PaymentStatus::from_db(&row.payment_status).ok_or_else(|| {
            StoreError::InvalidRow(format!("payment_status '{}'", row.payment_status))
        })?;
        let fulfillment_status =
            FulfillmentStatus::from_db(&row.fulfillment_status).ok_or_else(|| {
                StoreError::InvalidRow(format!("fulfillment_status '{}'", row.fulfillment_status))
            })?;
        Ok(Order {
            id: row.id,
            stripe_session_id: row.stripe_session_id,
            stripe_payment_id: row.stripe_payment_id,
            last_stripe_event_id: row.last_stripe_event_id,
            payment_status,
            fulfillment_status,
            email: row.email,
            name: row.name,
            phone: row.phone,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            region: row.region,
            postal_code: row.postal_code,
            country: row.country,
            currency: row.currency,
            subtotal_cents: row.subtotal_cents,
            shipping_cents: row.shipping_cents,
            total_cents: row.total_cents,
            shipping_carrier: row.shipping_carrier,
            tracking_number: row.tracking_number,
            shipped_at: row.shipped_at,
            confirmation_email_sent_at: row.confirmation_email_sent_at,
            stock_applied_at: row.stock_applied_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub size: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let size = match row.size.as_deref() {
            None => None,
            Some(s) => Some(
                Size::parse(s).ok_or_else(|| StoreError::InvalidRow(format!("size '{s}'")))?,
            ),
        };
        Ok(OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            name: row.name,
            price_cents: row.price_cents,
            quantity: row.quantity,
            size,
        })
    }
}

// ════════════════════════════════════════════════════════════════
// Reconciliation writes (run inside one transaction)
// ════════════════════════════════════════════════════════════════

pub async fn find_id_by_event(
    pool: &PgPool,
    event_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM orders WHERE last_stripe_event_id = $1")
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

/// Result row of [`upsert_from_session`]
#[derive(sqlx::FromRow)]
pub struct UpsertedOrder {
    pub id: String,
    pub inserted: bool,
    pub payment_status: String,
}

/// Insert or update the order for `record.session_id`.
///
/// The update branch only fires when the stored last event id differs from
/// the incoming one, so `None` means this event was already applied by a
/// concurrent delivery. Fulfillment status is never written on update.
/// A refunded order stays refunded, a paid order is not downgraded to pending.
pub async fn upsert_from_session(
    conn: &mut PgConnection,
    new_id: &str,
    record: &SessionRecord,
    now: i64,
) -> Result<Option<UpsertedOrder>, sqlx::Error> {
    let c = &record.customer;
    sqlx::query_as(
        r#"
        INSERT INTO orders (
            id, stripe_session_id, stripe_payment_id, last_stripe_event_id,
            payment_status, fulfillment_status,
            email, name, phone,
            address_line1, address_line2, city, region, postal_code, country,
            currency, subtotal_cents, shipping_cents, total_cents, created_at
        )
        VALUES ($1, $2, $3, $4, $5, 'unfulfilled', $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19)
        ON CONFLICT (stripe_session_id)
        DO UPDATE SET
            stripe_payment_id = COALESCE(EXCLUDED.stripe_payment_id, orders.stripe_payment_id),
            last_stripe_event_id = EXCLUDED.last_stripe_event_id,
            payment_status = CASE
                WHEN orders.payment_status = 'refunded' THEN orders.payment_status
                WHEN orders.payment_status = 'paid' AND EXCLUDED.payment_status = 'pending'
                    THEN orders.payment_status
                ELSE EXCLUDED.payment_status
            END,
            email = EXCLUDED.email, name = EXCLUDED.name, phone = EXCLUDED.phone,
            address_line1 = EXCLUDED.address_line1, address_line2 = EXCLUDED.address_line2,
            city = EXCLUDED.city, region = EXCLUDED.region,
            postal_code = EXCLUDED.postal_code, country = EXCLUDED.country,
            currency = EXCLUDED.currency,
            subtotal_cents = EXCLUDED.subtotal_cents,
            shipping_cents = EXCLUDED.shipping_cents,
            total_cents = EXCLUDED.total_cents
        WHERE orders.last_stripe_event_id IS DISTINCT FROM EXCLUDED.last_stripe_event_id
        RETURNING id, (xmax = 0) AS inserted, payment_status
        "#,
    )
    .bind(new_id)
    .bind(&record.session_id)
    .bind(&record.payment_id)
    .bind(&record.event_id)
    .bind(record.payment_status.as_db())
    .bind(&c.email)
    .bind(&c.name)
    .bind(&c.phone)
    .bind(&c.address_line1)
    .bind(&c.address_line2)
    .bind(&c.city)
    .bind(&c.region)
    .bind(&c.postal_code)
    .bind(&c.country)
    .bind(&record.currency)
    .bind(record.subtotal_cents)
    .bind(record.shipping_cents)
    .bind(record.total_cents)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Delete all items of the order and insert the given lines in order
pub async fn replace_items(
    conn: &mut PgConnection,
    order_id: &str,
    lines: &[ResolvedLine],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, position, name, price_cents, quantity, size)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(&line.product_id)
        .bind(position as i32)
        .bind(&line.name)
        .bind(line.unit_price_cents)
        .bind(line.quantity)
        .bind(line.size.as_str())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Claim the one-time stock decrement for an order
pub async fn claim_stock(
    conn: &mut PgConnection,
    order_id: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET stock_applied_at = $2 WHERE id = $1 AND stock_applied_at IS NULL",
    )
    .bind(order_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

// ════════════════════════════════════════════════════════════════
// Secondary transitions
// ════════════════════════════════════════════════════════════════

pub async fn mark_failed_by_session(
    pool: &PgPool,
    session_id: &str,
    event_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET payment_status = 'failed', last_stripe_event_id = $2
         WHERE stripe_session_id = $1",
    )
    .bind(session_id)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_refunded_by_payment(
    pool: &PgPool,
    payment_id: &str,
    event_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET payment_status = 'refunded', last_stripe_event_id = $2
         WHERE stripe_payment_id = $1",
    )
    .bind(payment_id)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn claim_confirmation_email(
    pool: &PgPool,
    order_id: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET confirmation_email_sent_at = $2
         WHERE id = $1 AND confirmation_email_sent_at IS NULL",
    )
    .bind(order_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn release_confirmation_email(pool: &PgPool, order_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET confirmation_email_sent_at = NULL WHERE id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════
// Reads
// ════════════════════════════════════════════════════════════════

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE stripe_session_id = $1")
        .bind(session_id)
        .fetch_optional(pool)
        .await
}

pub async fn items_for_order(
    pool: &PgPool,
    order_id: &str,
) -> Result<Vec<OrderItemRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, order_id, product_id, name, price_cents, quantity, size
         FROM order_items WHERE order_id = $1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

pub async fn list(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<OrderRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE ($1::TEXT IS NULL OR payment_status = $1)
            AND ($2::TEXT IS NULL OR fulfillment_status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filter.payment_status.map(|s| s.as_db()))
    .bind(filter.fulfillment_status.map(|s| s.as_db()))
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await
}

// ════════════════════════════════════════════════════════════════
// Admin edits
// ════════════════════════════════════════════════════════════════

pub async fn set_payment_status(
    pool: &PgPool,
    order_id: &str,
    status: PaymentStatus,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET payment_status = $2 WHERE id = $1 RETURNING *")
        .bind(order_id)
        .bind(status.as_db())
        .fetch_optional(pool)
        .await
}

pub async fn set_fulfillment_status(
    pool: &PgPool,
    order_id: &str,
    status: FulfillmentStatus,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET fulfillment_status = $2 WHERE id = $1 RETURNING *")
        .bind(order_id)
        .bind(status.as_db())
        .fetch_optional(pool)
        .await
}

pub async fn update_shipping(
    pool: &PgPool,
    order_id: &str,
    update: &ShippingUpdate,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE orders SET
            shipping_carrier = $2,
            tracking_number = $3,
            shipped_at = COALESCE($4, shipped_at),
            fulfillment_status = CASE WHEN $4::BIGINT IS NULL THEN fulfillment_status ELSE 'shipped' END
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(&update.shipping_carrier)
    .bind(&update.tracking_number)
    .bind(update.shipped_at)
    .fetch_optional(pool)
    .await
}
