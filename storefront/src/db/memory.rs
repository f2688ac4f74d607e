//! In-process [`OrderStore`]
//!
//! Every write clones the state, mutates the copy and swaps it in only on
//! success, so a failed reconciliation leaves nothing behind. Used by tests
//! and local demos without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{FulfillmentStatus, Order, OrderDetail, OrderItem, PaymentStatus, Product};
use shared::util::now_millis;

use super::{
    ApplyOutcome, OrderFilter, OrderStore, SessionRecord, ShippingUpdate, StoreError, StoreResult,
};

#[derive(Debug, Default, Clone)]
struct State {
    products: HashMap<String, Product>,
    orders: HashMap<String, Order>,
    items: HashMap<String, Vec<OrderItem>>,
}

impl State {
    fn order_by_session_mut(&mut self, session_id: &str) -> Option<&mut Order> {
        self.orders
            .values_mut()
            .find(|o| o.stripe_session_id == session_id)
    }

    fn detail(&self, order: &Order) -> OrderDetail {
        OrderDetail {
            order: order.clone(),
            items: self.items.get(&order.id).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog product
    pub fn upsert_product(&self, product: Product) {
        self.state
            .lock()
            .products
            .insert(product.id.clone(), product);
    }

    /// Run `f` against a copy of the state; commit the copy only on `Ok`
    fn transaction<T>(&self, f: impl FnOnce(&mut State) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.state.lock();
        let mut copy = guard.clone();
        let value = f(&mut copy)?;
        *guard = copy;
        Ok(value)
    }

    fn update_order(
        &self,
        order_id: &str,
        f: impl FnOnce(&mut Order),
    ) -> StoreResult<Option<Order>> {
        let mut state = self.state.lock();
        Ok(state.orders.get_mut(order_id).map(|order| {
            f(order);
            order.clone()
        }))
    }
}

fn apply(state: &mut State, record: &SessionRecord, now: i64) -> StoreResult<ApplyOutcome> {
    for line in &record.lines {
        if !state.products.contains_key(&line.product_id) {
            return Err(StoreError::UnknownProduct(line.product_id.clone()));
        }
    }

    let c = &record.customer;
    let created;
    let order_id;
    match state.order_by_session_mut(&record.session_id) {
        Some(order) => {
            if order.last_stripe_event_id.as_deref() == Some(record.event_id.as_str()) {
                return Ok(ApplyOutcome::AlreadyApplied {
                    order_id: order.id.clone(),
                });
            }
            if record.payment_id.is_some() {
                order.stripe_payment_id = record.payment_id.clone();
            }
            order.last_stripe_event_id = Some(record.event_id.clone());
            order.payment_status = match (order.payment_status, record.payment_status) {
                (PaymentStatus::Refunded, _) => PaymentStatus::Refunded,
                (PaymentStatus::Paid, PaymentStatus::Pending) => PaymentStatus::Paid,
                (_, incoming) => incoming,
            };
            order.email = c.email.clone();
            order.name = c.name.clone();
            order.phone = c.phone.clone();
            order.address_line1 = c.address_line1.clone();
            order.address_line2 = c.address_line2.clone();
            order.city = c.city.clone();
            order.region = c.region.clone();
            order.postal_code = c.postal_code.clone();
            order.country = c.country.clone();
            order.currency = record.currency.clone();
            order.subtotal_cents = record.subtotal_cents;
            order.shipping_cents = record.shipping_cents;
            order.total_cents = record.total_cents;
            created = false;
            order_id = order.id.clone();
        }
        None => {
            let order = Order {
                id: uuid::Uuid::new_v4().to_string(),
                stripe_session_id: record.session_id.clone(),
                stripe_payment_id: record.payment_id.clone(),
                last_stripe_event_id: Some(record.event_id.clone()),
                payment_status: record.payment_status,
                fulfillment_status: FulfillmentStatus::Unfulfilled,
                email: c.email.clone(),
                name: c.name.clone(),
                phone: c.phone.clone(),
                address_line1: c.address_line1.clone(),
                address_line2: c.address_line2.clone(),
                city: c.city.clone(),
                region: c.region.clone(),
                postal_code: c.postal_code.clone(),
                country: c.country.clone(),
                currency: record.currency.clone(),
                subtotal_cents: record.subtotal_cents,
                shipping_cents: record.shipping_cents,
                total_cents: record.total_cents,
                shipping_carrier: None,
                tracking_number: None,
                shipped_at: None,
                confirmation_email_sent_at: None,
                stock_applied_at: None,
                created_at: now,
            };
            created = true;
            order_id = order.id.clone();
            state.orders.insert(order.id.clone(), order);
        }
    }

    let items = record
        .lines
        .iter()
        .map(|line| OrderItem {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price_cents: line.unit_price_cents,
            quantity: line.quantity,
            size: Some(line.size),
        })
        .collect();
    state.items.insert(order_id.clone(), items);

    let mut stock_applied = false;
    if let Some(order) = state.orders.get_mut(&order_id)
        && order.payment_status == PaymentStatus::Paid
        && order.stock_applied_at.is_none()
    {
        order.stock_applied_at = Some(now);
        for line in record.lines_in_lock_order() {
            let stock = state
                .products
                .get_mut(&line.product_id)
                .map(|p| p.stock_for_mut(line.size))
                .ok_or_else(|| StoreError::UnknownProduct(line.product_id.clone()))?;
            if *stock < line.quantity {
                return Err(StoreError::StockUnderflow {
                    product_id: line.product_id.clone(),
                    size: line.size,
                    requested: line.quantity,
                });
            }
            *stock -= line.quantity;
        }
        stock_applied = true;
    }

    Ok(ApplyOutcome::Applied {
        order_id,
        created,
        stock_applied,
    })
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list_active_products(&self) -> StoreResult<Vec<Product>> {
        let state = self.state.lock();
        let mut products: Vec<Product> =
            state.products.values().filter(|p| p.active).cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().products.get(id).cloned())
    }

    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let state = self.state.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn order_id_for_event(&self, event_id: &str) -> StoreResult<Option<String>> {
        let state = self.state.lock();
        Ok(state
            .orders
            .values()
            .find(|o| o.last_stripe_event_id.as_deref() == Some(event_id))
            .map(|o| o.id.clone()))
    }

    async fn apply_session(&self, record: &SessionRecord) -> StoreResult<ApplyOutcome> {
        let now = now_millis();
        self.transaction(|state| apply(state, record, now))
    }

    async fn mark_session_failed(&self, session_id: &str, event_id: &str) -> StoreResult<bool> {
        let mut state = self.state.lock();
        Ok(match state.order_by_session_mut(session_id) {
            Some(order) => {
                order.payment_status = PaymentStatus::Failed;
                order.last_stripe_event_id = Some(event_id.to_string());
                true
            }
            None => false,
        })
    }

    async fn mark_payment_refunded(&self, payment_id: &str, event_id: &str) -> StoreResult<bool> {
        let mut state = self.state.lock();
        let mut matched = false;
        for order in state.orders.values_mut() {
            if order.stripe_payment_id.as_deref() == Some(payment_id) {
                order.payment_status = PaymentStatus::Refunded;
                order.last_stripe_event_id = Some(event_id.to_string());
                matched = true;
            }
        }
        Ok(matched)
    }

    async fn claim_confirmation_email(&self, order_id: &str, now: i64) -> StoreResult<bool> {
        let mut state = self.state.lock();
        Ok(match state.orders.get_mut(order_id) {
            Some(order) if order.confirmation_email_sent_at.is_none() => {
                order.confirmation_email_sent_at = Some(now);
                true
            }
            _ => false,
        })
    }

    async fn release_confirmation_email(&self, order_id: &str) -> StoreResult<()> {
        if let Some(order) = self.state.lock().orders.get_mut(order_id) {
            order.confirmation_email_sent_at = None;
        }
        Ok(())
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<OrderDetail>> {
        let state = self.state.lock();
        Ok(state.orders.get(id).map(|o| state.detail(o)))
    }

    async fn find_order_by_session(&self, session_id: &str) -> StoreResult<Option<OrderDetail>> {
        let state = self.state.lock();
        Ok(state
            .orders
            .values()
            .find(|o| o.stripe_session_id == session_id)
            .map(|o| state.detail(o)))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let state = self.state.lock();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.payment_status.is_none_or(|s| o.payment_status == s))
            .filter(|o| {
                filter
                    .fulfillment_status
                    .is_none_or(|s| o.fulfillment_status == s)
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn set_payment_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
    ) -> StoreResult<Option<Order>> {
        self.update_order(order_id, |o| o.payment_status = status)
    }

    async fn set_fulfillment_status(
        &self,
        order_id: &str,
        status: FulfillmentStatus,
    ) -> StoreResult<Option<Order>> {
        self.update_order(order_id, |o| o.fulfillment_status = status)
    }

    async fn update_shipping(
        &self,
        order_id: &str,
        update: &ShippingUpdate,
    ) -> StoreResult<Option<Order>> {
        self.update_order(order_id, |o| {
            o.shipping_carrier = update.shipping_carrier.clone();
            o.tracking_number = update.tracking_number.clone();
            if let Some(at) = update.shipped_at {
                o.shipped_at = Some(at);
                o.fulfillment_status = FulfillmentStatus::Shipped;
            }
        })
    }
}
