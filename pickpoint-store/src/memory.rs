use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use pickpoint_core::repository::{OrderStore, StoreTx};
use pickpoint_core::{CustomerId, Order, OrderId, StoreError};

/// In-memory order store for tests and throwaway deployments.
///
/// One mutex guards the whole map and an open transaction owns it until
/// commit or drop, so store access is fully serialized and writers never
/// observe [`StoreError::Conflict`].
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<Mutex<BTreeMap<i64, Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn add_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().await;
        let key = order.order_id.get();
        if orders.contains_key(&key) {
            return Err(StoreError::OrderExists);
        }
        orders.insert(key, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let orders = self.orders.lock().await;
        orders.get(&id.get()).cloned().ok_or(StoreError::OrderNotFound)
    }

    async fn get_customers_orders(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.lock().await;
        Ok(orders
            .values()
            .filter(|o| o.customer_id == customer)
            .cloned()
            .collect())
    }

    async fn get_refunds(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.lock().await;
        Ok(orders.values().filter(|o| o.refunded).cloned().collect())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.orders).lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            staged: BTreeMap::new(),
        }))
    }
}

/// A write-staged view over the locked map. `None` stages a deletion.
/// Nothing touches the shared map until [`StoreTx::commit`].
struct MemoryTx {
    guard: OwnedMutexGuard<BTreeMap<i64, Order>>,
    staged: BTreeMap<i64, Option<Order>>,
}

impl MemoryTx {
    fn current(&self, id: OrderId) -> Result<Order, StoreError> {
        match self.staged.get(&id.get()) {
            Some(Some(order)) => Ok(order.clone()),
            Some(None) => Err(StoreError::OrderNotFound),
            None => self
                .guard
                .get(&id.get())
                .cloned()
                .ok_or(StoreError::OrderNotFound),
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn get_order(&mut self, id: OrderId) -> Result<Order, StoreError> {
        self.current(id)
    }

    async fn change_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.current(order.order_id)?;
        self.staged.insert(order.order_id.get(), Some(order.clone()));
        Ok(())
    }

    async fn receive_order(
        &mut self,
        id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let mut order = self.current(id)?;
        order.received_time = Some(now);
        order.received_by_customer = true;
        self.staged.insert(id.get(), Some(order.clone()));
        Ok(order)
    }

    async fn return_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        self.current(id)?;
        self.staged.insert(id.get(), None);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, staged } = *self;
        for (key, slot) in staged {
            match slot {
                Some(order) => {
                    guard.insert(key, order);
                }
                None => {
                    guard.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pickpoint_core::packaging::PackageKind;

    fn order(id: i64, customer: i64) -> Order {
        Order {
            order_id: OrderId::new(id).unwrap(),
            customer_id: CustomerId::new(customer).unwrap(),
            expiration_time: Utc::now() + Duration::days(2),
            received_time: None,
            received_by_customer: false,
            refunded: false,
            package: PackageKind::Bag,
            weight: 1.0,
            cost: 105,
            package_cost: 5,
        }
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = MemoryOrderStore::new();
        store.add_order(&order(1, 7)).await.unwrap();

        let fetched = store.get_order(OrderId::new(1).unwrap()).await.unwrap();
        assert_eq!(fetched.customer_id.get(), 7);

        let missing = store.get_order(OrderId::new(2).unwrap()).await;
        assert!(matches!(missing, Err(StoreError::OrderNotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_add_rejected() {
        let store = MemoryOrderStore::new();
        store.add_order(&order(1, 7)).await.unwrap();
        let dup = store.add_order(&order(1, 8)).await;
        assert!(matches!(dup, Err(StoreError::OrderExists)));
    }

    #[tokio::test]
    async fn test_listings_sorted_by_order_id() {
        let store = MemoryOrderStore::new();
        store.add_order(&order(3, 7)).await.unwrap();
        store.add_order(&order(1, 7)).await.unwrap();
        store.add_order(&order(2, 8)).await.unwrap();

        let listed = store
            .get_customers_orders(CustomerId::new(7).unwrap())
            .await
            .unwrap();
        let ids: Vec<i64> = listed.iter().map(|o| o.order_id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let store = MemoryOrderStore::new();
        store.add_order(&order(1, 7)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let now = Utc::now();
        let received = tx.receive_order(OrderId::new(1).unwrap(), now).await.unwrap();
        assert!(received.received_by_customer);
        tx.commit().await.unwrap();

        let fetched = store.get_order(OrderId::new(1).unwrap()).await.unwrap();
        assert!(fetched.received_by_customer);
        assert_eq!(fetched.received_time, Some(now));
    }

    #[tokio::test]
    async fn test_drop_discards_staged_writes() {
        let store = MemoryOrderStore::new();
        store.add_order(&order(1, 7)).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.return_order(OrderId::new(1).unwrap()).await.unwrap();
            // dropped without commit
        }

        assert!(store.get_order(OrderId::new(1).unwrap()).await.is_ok());
    }

    #[tokio::test]
    async fn test_return_inside_tx_deletes_on_commit() {
        let store = MemoryOrderStore::new();
        store.add_order(&order(1, 7)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.return_order(OrderId::new(1).unwrap()).await.unwrap();
        // the staged delete is visible to reads inside the transaction
        assert!(matches!(
            tx.get_order(OrderId::new(1).unwrap()).await,
            Err(StoreError::OrderNotFound)
        ));
        tx.commit().await.unwrap();

        assert!(matches!(
            store.get_order(OrderId::new(1).unwrap()).await,
            Err(StoreError::OrderNotFound)
        ));
    }
}
