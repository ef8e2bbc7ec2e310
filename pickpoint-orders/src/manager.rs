use std::sync::Arc;

use chrono::Utc;

use pickpoint_core::packaging::{PackageKind, PackagingError};
use pickpoint_core::repository::OrderStore;
use pickpoint_core::{CustomerId, Order, OrderId, StoreError};

/// Input for [`OrderManager::add_order`]. The package arrives as its wire
/// string so the packaging policy is resolved here, not at the boundary.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub expiration_time: chrono::DateTime<Utc>,
    pub package: String,
    pub weight: f64,
    pub cost: i64,
}

/// Runs the order lifecycle rules over an injected store. Every mutation
/// reads, gates and writes inside one store transaction.
pub struct OrderManager {
    store: Arc<dyn OrderStore>,
}

impl OrderManager {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Accept a parcel from the courier.
    pub async fn add_order(&self, new_order: NewOrder) -> Result<Order, OrderError> {
        let NewOrder {
            order_id,
            customer_id,
            expiration_time,
            package,
            weight,
            cost,
        } = new_order;

        if expiration_time <= Utc::now() {
            return Err(OrderError::WrongExpiration);
        }

        let package = PackageKind::parse(&package)?;
        package.validate_weight(weight)?;

        match self.store.get_order(order_id).await {
            Ok(_) => return Err(OrderError::Exists(order_id)),
            Err(StoreError::OrderNotFound) => {}
            Err(err) => return Err(store_failure("add_order", err)),
        }

        let order = Order {
            order_id,
            customer_id,
            expiration_time,
            received_time: None,
            received_by_customer: false,
            refunded: false,
            package,
            weight,
            cost: cost + package.cost(),
            package_cost: package.cost(),
        };

        // The insert itself still races other writers; a unique violation
        // here means somebody won between the pre-check and now.
        self.store.add_order(&order).await.map_err(|err| match err {
            StoreError::OrderExists => OrderError::Exists(order_id),
            other => store_failure("add_order", other),
        })?;

        Ok(order)
    }

    /// Hand a parcel back to the courier, deleting its record. Returns the
    /// row as it stood before deletion.
    pub async fn return_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|err| store_failure("return_order", err))?;
        let order = match tx.get_order(order_id).await {
            Ok(order) => order,
            Err(StoreError::OrderNotFound) => return Err(OrderError::NotFound(order_id)),
            Err(err) => return Err(store_failure("return_order", err)),
        };

        if !order.returnable_to_courier_at(Utc::now()) {
            return Err(OrderError::CannotReturn);
        }

        tx.return_order(order_id)
            .await
            .map_err(|err| conflict_as("return_order", err, OrderError::CannotReturn))?;
        tx.commit()
            .await
            .map_err(|err| conflict_as("return_order", err, OrderError::CannotReturn))?;

        Ok(order)
    }

    /// Hand a batch of parcels to one customer. The whole batch shares one
    /// transaction and one receive timestamp; any ineligible member rolls
    /// everything back.
    pub async fn receive_orders(&self, order_ids: &[OrderId]) -> Result<Vec<Order>, OrderError> {
        let Some(&first) = order_ids.first() else {
            return Err(OrderError::CannotReceive);
        };

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|err| store_failure("receive_orders", err))?;
        let owner = match tx.get_order(first).await {
            Ok(order) => order.customer_id,
            Err(StoreError::OrderNotFound) => return Err(OrderError::NotFound(first)),
            Err(err) => return Err(store_failure("receive_orders", err)),
        };

        let now = Utc::now();
        let mut received = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            let candidate = tx.get_order(order_id).await.map_err(|err| match err {
                StoreError::OrderNotFound => OrderError::CannotReceive,
                other => store_failure("receive_orders", other),
            })?;

            if !candidate.collectible_at(now)
                || candidate.received_by_customer
                || candidate.customer_id != owner
            {
                return Err(OrderError::CannotReceive);
            }

            let updated = tx
                .receive_order(order_id, now)
                .await
                .map_err(|err| conflict_as("receive_orders", err, OrderError::CannotReceive))?;
            received.push(updated);
        }

        tx.commit()
            .await
            .map_err(|err| conflict_as("receive_orders", err, OrderError::CannotReceive))?;

        Ok(received)
    }

    /// List a customer's orders; `n > 0` keeps only the first `n`.
    pub async fn get_orders(&self, customer: CustomerId, n: i64) -> Result<Vec<Order>, OrderError> {
        let mut orders = self
            .store
            .get_customers_orders(customer)
            .await
            .map_err(|err| store_failure("get_orders", err))?;

        if n > 0 {
            orders.truncate(n as usize);
        }
        Ok(orders)
    }

    /// Refund a collected parcel. Exactly one of any set of concurrent
    /// attempts succeeds; the rest see the gate fail or the commit conflict.
    pub async fn refund_order(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<Order, OrderError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|err| store_failure("refund_order", err))?;
        let mut order = match tx.get_order(order_id).await {
            Ok(order) => order,
            Err(StoreError::OrderNotFound) => return Err(OrderError::NotFound(order_id)),
            Err(err) => return Err(store_failure("refund_order", err)),
        };

        if order.customer_id != customer_id
            || !order.received_by_customer
            || order.refunded
            || !order.within_refund_window(Utc::now())
        {
            return Err(OrderError::CannotRefund);
        }

        order.refunded = true;
        tx.change_order(&order)
            .await
            .map_err(|err| conflict_as("refund_order", err, OrderError::CannotRefund))?;
        tx.commit()
            .await
            .map_err(|err| conflict_as("refund_order", err, OrderError::CannotRefund))?;

        Ok(order)
    }

    /// One zero-based page of the refund listing; `limit <= 0` returns the
    /// whole set.
    pub async fn get_refunds(&self, page: i64, limit: i64) -> Result<Vec<Order>, OrderError> {
        let refunds = self
            .store
            .get_refunds()
            .await
            .map_err(|err| store_failure("get_refunds", err))?;

        if limit <= 0 {
            return Ok(refunds);
        }
        if page < 0 {
            return Err(OrderError::Pagination);
        }

        let start = page.checked_mul(limit).ok_or(OrderError::Pagination)?;
        if start > refunds.len() as i64 {
            return Err(OrderError::Pagination);
        }

        Ok(refunds
            .into_iter()
            .skip(start as usize)
            .take(limit as usize)
            .collect())
    }
}

/// A serialization failure means a concurrent writer invalidated the gate
/// this operation checked, so it surfaces as that gate's rejection. Anything
/// else is a real backend failure and is logged with the operation name.
fn conflict_as(op: &'static str, err: StoreError, state_conflict: OrderError) -> OrderError {
    match err {
        StoreError::Conflict => state_conflict,
        other => store_failure(op, other),
    }
}

/// Wraps a backend failure, recording which lifecycle operation hit it so
/// the log carries that context even for callers outside a request span.
fn store_failure(op: &'static str, err: StoreError) -> OrderError {
    tracing::error!("Order store failure in {}: {}", op, err);
    OrderError::Store(err)
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("wrong expiration date")]
    WrongExpiration,

    #[error("invalid package")]
    InvalidPackage,

    #[error("weight exceeded")]
    WeightExceeded,

    #[error("order already exists: {0}")]
    Exists(OrderId),

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("can not delete this order. this order might be already received or expiration date is not passed")]
    CannotReturn,

    #[error("can not receive other orders. one of them probably has not belong to customer or already received or expiration time has passed")]
    CannotReceive,

    #[error("can not refund this order. make sure it is yours, you received it and refund time (2 days) has not passed")]
    CannotRefund,

    #[error("page is out of range")]
    Pagination,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<PackagingError> for OrderError {
    fn from(err: PackagingError) -> Self {
        match err {
            PackagingError::InvalidPackage => Self::InvalidPackage,
            PackagingError::WeightExceeded => Self::WeightExceeded,
        }
    }
}
