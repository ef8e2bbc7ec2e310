use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use pickpoint_core::packaging::PackageKind;
use pickpoint_core::repository::{OrderStore, StoreTx};
use pickpoint_core::{CustomerId, Order, OrderId, StoreError};

const ORDER_COLUMNS: &str = "order_id, customer_id, expiration_time, received_time, \
     received_by_customer, refunded, package, weight, cost, package_cost";

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: i64,
    customer_id: i64,
    expiration_time: DateTime<Utc>,
    received_time: Option<DateTime<Utc>>,
    received_by_customer: bool,
    refunded: bool,
    package: String,
    weight: f64,
    cost: i64,
    package_cost: i64,
}

impl OrderRow {
    fn into_domain(self) -> Result<Order, StoreError> {
        Ok(Order {
            order_id: OrderId::new(self.order_id).map_err(StoreError::backend)?,
            customer_id: CustomerId::new(self.customer_id).map_err(StoreError::backend)?,
            expiration_time: self.expiration_time,
            received_time: self.received_time,
            received_by_customer: self.received_by_customer,
            refunded: self.refunded,
            package: PackageKind::parse(&self.package).map_err(StoreError::backend)?,
            weight: self.weight,
            cost: self.cost,
            package_cost: self.package_cost,
        })
    }
}

/// Unique violations and repeatable-read serialization failures carry
/// dedicated SQLSTATEs; everything else is an opaque backend failure.
fn map_db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        match db.code().as_deref() {
            Some("23505") => return StoreError::OrderExists,
            Some("40001") => return StoreError::Conflict,
            _ => {}
        }
    }
    StoreError::backend(err)
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn add_order(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (order_id, customer_id, expiration_time, received_time, \
             received_by_customer, refunded, package, weight, cost, package_cost) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(order.order_id.get())
        .bind(order.customer_id.get())
        .bind(order.expiration_time)
        .bind(order.received_time)
        .bind(order.received_by_customer)
        .bind(order.refunded)
        .bind(order.package.as_str())
        .bind(order.weight)
        .bind(order.cost)
        .bind(order.package_cost)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.ok_or(StoreError::OrderNotFound)?.into_domain()
    }

    async fn get_customers_orders(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY order_id ASC"
        ))
        .bind(customer.get())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        rows.into_iter().map(OrderRow::into_domain).collect()
    }

    async fn get_refunds(&self) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE refunded ORDER BY order_id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        rows.into_iter().map(OrderRow::into_domain).collect()
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        // Must be the first statement of the transaction.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        Ok(Box::new(PgStoreTx { tx }))
    }
}

/// One open repeatable-read transaction over a pooled connection. Dropping
/// it without `commit` rolls back through sqlx.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn get_order(&mut self, id: OrderId) -> Result<Order, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        row.ok_or(StoreError::OrderNotFound)?.into_domain()
    }

    async fn change_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET customer_id = $2, expiration_time = $3, received_time = $4, \
             received_by_customer = $5, refunded = $6, package = $7, weight = $8, \
             cost = $9, package_cost = $10 WHERE order_id = $1",
        )
        .bind(order.order_id.get())
        .bind(order.customer_id.get())
        .bind(order.expiration_time)
        .bind(order.received_time)
        .bind(order.received_by_customer)
        .bind(order.refunded)
        .bind(order.package.as_str())
        .bind(order.weight)
        .bind(order.cost)
        .bind(order.package_cost)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound);
        }
        Ok(())
    }

    async fn receive_order(
        &mut self,
        id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET received_time = $2, received_by_customer = TRUE \
             WHERE order_id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.get())
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        row.ok_or(StoreError::OrderNotFound)?.into_domain()
    }

    async fn return_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_db_err)
    }
}
