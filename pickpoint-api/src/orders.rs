use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pickpoint_core::repository::customer_orders_key;
use pickpoint_core::{CustomerId, Order, OrderId, ValidationError};
use pickpoint_orders::NewOrder;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(add_order))
        .route("/v1/orders/receive", post(receive_orders))
        .route("/v1/orders/{order_id}", delete(return_order))
        .route("/v1/customers/{customer_id}/orders", get(get_orders))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddOrderRequest {
    pub order_id: i64,
    pub customer_id: i64,
    pub expiration_time: DateTime<Utc>,
    pub package: String,
    pub weight: f64,
    pub cost: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveOrdersRequest {
    pub order_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GetOrdersParams {
    pub count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: i64,
    pub customer_id: i64,
    pub expiration_time: DateTime<Utc>,
    pub received_time: Option<DateTime<Utc>>,
    pub received: bool,
    pub refunded: bool,
    pub package: String,
    pub weight: f64,
    pub cost: i64,
    pub package_cost: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id.get(),
            customer_id: order.customer_id.get(),
            expiration_time: order.expiration_time,
            received_time: order.received_time,
            received: order.received_by_customer,
            refunded: order.refunded,
            package: order.package.as_str().to_string(),
            weight: order.weight,
            cost: order.cost,
            package_cost: order.package_cost,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Accept a parcel from the courier.
async fn add_order(
    State(state): State<AppState>,
    Json(req): Json<AddOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order_id = OrderId::new(req.order_id)?;
    let customer_id = CustomerId::new(req.customer_id)?;
    if !req.weight.is_finite() || req.weight < 0.0 {
        return Err(ValidationError::NegativeWeight.into());
    }
    if req.cost < 0 {
        return Err(ValidationError::NegativeCost.into());
    }

    let order = state
        .orders
        .add_order(NewOrder {
            order_id,
            customer_id,
            expiration_time: req.expiration_time,
            package: req.package,
            weight: req.weight,
            cost: req.cost,
        })
        .await?;

    state.metrics.orders_added.inc();
    state.invalidate_customer(customer_id).await;
    state.publish_command("add_order", Some(order_id), Some(customer_id));

    Ok(Json(order.into()))
}

/// DELETE /v1/orders/{order_id}
/// Hand a parcel back to the courier. Responds with the deleted record.
async fn return_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, AppError> {
    let order_id = OrderId::new(order_id)?;

    let order = state.orders.return_order(order_id).await?;

    state.invalidate_customer(order.customer_id).await;
    state.publish_command("return_order", Some(order_id), Some(order.customer_id));

    Ok(Json(order.into()))
}

/// POST /v1/orders/receive
/// Hand a batch of parcels to their customer.
async fn receive_orders(
    State(state): State<AppState>,
    Json(req): Json<ReceiveOrdersRequest>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let mut ids = Vec::with_capacity(req.order_ids.len());
    for raw in req.order_ids {
        ids.push(OrderId::new(raw)?);
    }

    let received = state.orders.receive_orders(&ids).await?;

    state.metrics.orders_received.inc_by(received.len() as u64);
    if let Some(first) = received.first() {
        state.invalidate_customer(first.customer_id).await;
        state.publish_command("receive_orders", None, Some(first.customer_id));
    }

    Ok(Json(received.into_iter().map(OrderResponse::from).collect()))
}

/// GET /v1/customers/{customer_id}/orders?count=n
/// List a customer's orders through the cache.
async fn get_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Query(params): Query<GetOrdersParams>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let customer = CustomerId::new(customer_id)?;
    let count = params.count.unwrap_or(0);

    let key = customer_orders_key(customer);
    let orders = match state.cache.get(&key).await {
        Some(orders) => orders,
        None => {
            let orders = state.orders.get_orders(customer, count).await?;
            if !orders.is_empty() {
                if let Err(err) = state.cache.set(&key, &orders).await {
                    tracing::warn!("Failed to populate cache key {}: {}", key, err);
                }
            }
            orders
        }
    };

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
