use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Lifecycle counters on a private registry, rendered by the metrics
/// endpoint. Handlers bump them after the operation succeeded.
pub struct Metrics {
    registry: Registry,
    pub orders_added: IntCounter,
    pub orders_received: IntCounter,
    pub orders_refunded: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_added =
            IntCounter::new("orders_added_total", "Total number of added orders")?;
        registry.register(Box::new(orders_added.clone()))?;

        let orders_received =
            IntCounter::new("orders_received_total", "Total number of received orders")?;
        registry.register(Box::new(orders_received.clone()))?;

        let orders_refunded =
            IntCounter::new("orders_refunded_total", "Total number of refunded orders")?;
        registry.register(Box::new(orders_refunded.clone()))?;

        Ok(Self {
            registry,
            orders_added,
            orders_received,
            orders_refunded,
        })
    }

    /// Prometheus text exposition of every registered counter.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", err);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
