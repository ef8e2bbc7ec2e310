use std::sync::Arc;

use chrono::Utc;

use pickpoint_core::events::CommandEvent;
use pickpoint_core::repository::{customer_orders_key, OrderCache};
use pickpoint_core::{CustomerId, OrderId};
use pickpoint_orders::OrderManager;
use pickpoint_store::EventProducer;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderManager>,
    pub cache: Arc<dyn OrderCache>,
    pub events: Option<Arc<EventProducer>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Drop the customer's cached listing after a successful mutation.
    /// Failure only warns: the store already holds the truth and the entry
    /// expires on its own.
    pub async fn invalidate_customer(&self, customer: CustomerId) {
        let key = customer_orders_key(customer);
        if let Err(err) = self.cache.delete(&key).await {
            tracing::warn!("Failed to invalidate cache key {}: {}", key, err);
        }
    }

    /// Fire-and-forget audit event for a mutating operation.
    pub fn publish_command(
        &self,
        method: &str,
        order_id: Option<OrderId>,
        customer_id: Option<CustomerId>,
    ) {
        let Some(events) = self.events.clone() else {
            return;
        };
        let event = CommandEvent {
            occurred_at: Utc::now(),
            method: method.to_string(),
            order_id: order_id.map(OrderId::get),
            customer_id: customer_id.map(CustomerId::get),
        };
        tokio::spawn(async move {
            // delivery problems are logged by the producer itself
            let _ = events.publish_command(&event).await;
        });
    }
}
