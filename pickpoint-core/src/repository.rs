use async_trait::async_trait;

use crate::error::{CacheError, StoreError};
use crate::models::{CustomerId, Order, OrderId};

/// Storage capability for orders. Listing reads go straight through the
/// handle; single-row mutations run inside a [`StoreTx`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn add_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError>;

    /// Every order of one customer, any state, `order_id` ascending.
    async fn get_customers_orders(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<Order>, StoreError>;

    /// Every refunded order, `order_id` ascending.
    async fn get_refunds(&self) -> Result<Vec<Order>, StoreError>;

    /// Open a repeatable-read transaction. Dropping the handle rolls back;
    /// only [`StoreTx::commit`] makes staged writes visible.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One open store transaction. Reads observe the transaction snapshot;
/// writes stage against it. A concurrent writer that touches the same row
/// first surfaces as [`StoreError::Conflict`].
#[async_trait]
pub trait StoreTx: Send {
    async fn get_order(&mut self, id: OrderId) -> Result<Order, StoreError>;

    /// Full-row update keyed by `order_id`.
    async fn change_order(&mut self, order: &Order) -> Result<(), StoreError>;

    /// Mark an order collected at `now` and return the updated row.
    async fn receive_order(
        &mut self,
        id: OrderId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Order, StoreError>;

    /// Remove the order row entirely.
    async fn return_order(&mut self, id: OrderId) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Listing cache in front of the store. `get` fails open: any backend or
/// decode problem reads as a miss.
#[async_trait]
pub trait OrderCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<Order>>;

    async fn set(&self, key: &str, orders: &[Order]) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache key for a customer's order listing.
pub fn customer_orders_key(customer: CustomerId) -> String {
    format!("get_orders_{customer}")
}

/// Cache key for one page of the refund listing.
pub fn refunds_page_key(page: i64, limit: i64) -> String {
    format!("get_refunds_p{page}_l{limit}")
}
