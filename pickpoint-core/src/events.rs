use chrono::{DateTime, Utc};

/// Audit record published after every successful mutating operation.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CommandEvent {
    pub occurred_at: DateTime<Utc>,
    /// Operation name, e.g. `add_order`.
    pub method: String,
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
}
