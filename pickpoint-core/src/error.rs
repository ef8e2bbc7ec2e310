//! Error taxonomy shared across the service.
//!
//! Validation and state errors are plain data so callers can map them to
//! transport codes; infrastructure failures stay boxed and opaque.

/// Rejections raised at the boundary before any business rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("empty or non-positive order or customer id")]
    IncorrectId,
    #[error("weight can not be negative")]
    NegativeWeight,
    #[error("cost can not be negative")]
    NegativeCost,
}

/// Failures surfaced by an order store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order already exists")]
    OrderExists,
    #[error("order not found")]
    OrderNotFound,
    /// The backend refused a concurrent write (serialization failure under
    /// repeatable read, or an equivalent in other backends).
    #[error("transaction conflict")]
    Conflict,
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Failures surfaced by a cache implementation.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}
