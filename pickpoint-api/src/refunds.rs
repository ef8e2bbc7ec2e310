use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use pickpoint_core::repository::refunds_page_key;
use pickpoint_core::{CustomerId, OrderId};

use crate::error::AppError;
use crate::orders::OrderResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders/{order_id}/refund", post(refund_order))
        .route("/v1/refunds", get(get_refunds))
}

#[derive(Debug, Deserialize)]
pub struct RefundOrderRequest {
    pub customer_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct GetRefundsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// POST /v1/orders/{order_id}/refund
/// Refund a collected parcel on its customer's behalf.
async fn refund_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(req): Json<RefundOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order_id = OrderId::new(order_id)?;
    let customer_id = CustomerId::new(req.customer_id)?;

    let order = state.orders.refund_order(customer_id, order_id).await?;

    state.metrics.orders_refunded.inc();
    state.invalidate_customer(customer_id).await;
    state.publish_command("refund_order", Some(order_id), Some(customer_id));

    Ok(Json(order.into()))
}

/// GET /v1/refunds?page=&limit=
/// One page of the refund listing, through the cache. Pages are never
/// invalidated; stale entries age out with the TTL.
async fn get_refunds(
    State(state): State<AppState>,
    Query(params): Query<GetRefundsParams>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let page = params.page.unwrap_or(0);
    let limit = params.limit.unwrap_or(0);

    let key = refunds_page_key(page, limit);
    let refunds = match state.cache.get(&key).await {
        Some(refunds) => refunds,
        None => {
            let refunds = state.orders.get_refunds(page, limit).await?;
            if !refunds.is_empty() {
                if let Err(err) = state.cache.set(&key, &refunds).await {
                    tracing::warn!("Failed to populate cache key {}: {}", key, err);
                }
            }
            refunds
        }
    };

    Ok(Json(refunds.into_iter().map(OrderResponse::from).collect()))
}
