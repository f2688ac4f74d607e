//! PostgreSQL-backed [`OrderStore`]

use async_trait::async_trait;
use shared::models::{FulfillmentStatus, Order, OrderDetail, PaymentStatus, Product};
use shared::util::now_millis;
use sqlx::PgPool;

use super::{
    ApplyOutcome, OrderFilter, OrderStore, SessionRecord, ShippingUpdate, StoreError, StoreResult,
    orders, products,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn detail(&self, row: Option<orders::OrderRow>) -> StoreResult<Option<OrderDetail>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;
        let items = orders::items_for_order(&self.pool, &order.id)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(OrderDetail { order, items }))
    }
}

fn to_order(row: Option<orders::OrderRow>) -> StoreResult<Option<Order>> {
    row.map(Order::try_from).transpose()
}

#[async_trait]
impl OrderStore for PgStore {
    async fn list_active_products(&self) -> StoreResult<Vec<Product>> {
        let rows = products::list_active(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(products::find_by_id(&self.pool, id).await?.map(Product::from))
    }

    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let rows = products::find_by_ids(&self.pool, ids).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn order_id_for_event(&self, event_id: &str) -> StoreResult<Option<String>> {
        Ok(orders::find_id_by_event(&self.pool, event_id).await?)
    }

    async fn apply_session(&self, record: &SessionRecord) -> StoreResult<ApplyOutcome> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let mut wanted: Vec<String> = record.lines.iter().map(|l| l.product_id.clone()).collect();
        wanted.sort();
        wanted.dedup();
        let known = products::existing_ids(&mut tx, &wanted).await?;
        if let Some(missing) = wanted.iter().find(|id| !known.contains(id)) {
            return Err(StoreError::UnknownProduct(missing.clone()));
        }

        let new_id = uuid::Uuid::new_v4().to_string();
        let Some(upserted) = orders::upsert_from_session(&mut tx, &new_id, record, now).await?
        else {
            // Same event id already stored: a concurrent delivery won.
            tx.commit().await?;
            let order_id = orders::find_by_session(&self.pool, &record.session_id)
                .await?
                .map(|row| row.id)
                .unwrap_or_default();
            return Ok(ApplyOutcome::AlreadyApplied { order_id });
        };

        orders::replace_items(&mut tx, &upserted.id, &record.lines).await?;

        let mut stock_applied = false;
        if upserted.payment_status == PaymentStatus::Paid.as_db()
            && orders::claim_stock(&mut tx, &upserted.id, now).await?
        {
            for line in record.lines_in_lock_order() {
                let ok =
                    products::decrement_stock(&mut tx, &line.product_id, line.size, line.quantity)
                        .await?;
                if !ok {
                    // Dropping tx rolls back the order, items and earlier decrements.
                    return Err(StoreError::StockUnderflow {
                        product_id: line.product_id.clone(),
                        size: line.size,
                        requested: line.quantity,
                    });
                }
            }
            stock_applied = true;
        }

        tx.commit().await?;
        Ok(ApplyOutcome::Applied {
            order_id: upserted.id,
            created: upserted.inserted,
            stock_applied,
        })
    }

    async fn mark_session_failed(&self, session_id: &str, event_id: &str) -> StoreResult<bool> {
        Ok(orders::mark_failed_by_session(&self.pool, session_id, event_id).await?)
    }

    async fn mark_payment_refunded(&self, payment_id: &str, event_id: &str) -> StoreResult<bool> {
        Ok(orders::mark_refunded_by_payment(&self.pool, payment_id, event_id).await?)
    }

    async fn claim_confirmation_email(&self, order_id: &str, now: i64) -> StoreResult<bool> {
        Ok(orders::claim_confirmation_email(&self.pool, order_id, now).await?)
    }

    async fn release_confirmation_email(&self, order_id: &str) -> StoreResult<()> {
        Ok(orders::release_confirmation_email(&self.pool, order_id).await?)
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<OrderDetail>> {
        let row = orders::find_by_id(&self.pool, id).await?;
        self.detail(row).await
    }

    async fn find_order_by_session(&self, session_id: &str) -> StoreResult<Option<OrderDetail>> {
        let row = orders::find_by_session(&self.pool, session_id).await?;
        self.detail(row).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        orders::list(&self.pool, filter)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn set_payment_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
    ) -> StoreResult<Option<Order>> {
        to_order(orders::set_payment_status(&self.pool, order_id, status).await?)
    }

    async fn set_fulfillment_status(
        &self,
        order_id: &str,
        status: FulfillmentStatus,
    ) -> StoreResult<Option<Order>> {
        to_order(orders::set_fulfillment_status(&self.pool, order_id, status).await?)
    }

    async fn update_shipping(
        &self,
        order_id: &str,
        update: &ShippingUpdate,
    ) -> StoreResult<Option<Order>> {
        to_order(orders::update_shipping(&self.pool, order_id, update).await?)
    }
}
