use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::warn;

use pickpoint_core::repository::OrderCache;
use pickpoint_core::{CacheError, Order};

/// Redis-backed listing cache. Values are JSON arrays of orders; every
/// entry expires after the configured TTL.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisCache {
    pub async fn new(connection_string: &str, ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, ttl_seconds })
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::backend)?;
        let raw: Option<String> = conn.get(key).await.map_err(CacheError::backend)?;
        Ok(raw)
    }
}

#[async_trait]
impl OrderCache for RedisCache {
    /// Reads fail open: a backend or decode problem logs a warning and
    /// reports a miss, so callers fall through to the store.
    async fn get(&self, key: &str) -> Option<Vec<Order>> {
        let raw = match self.fetch(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("Cache read failed for {}: {}", key, err);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(orders) => Some(orders),
            Err(err) => {
                warn!("Discarding undecodable cache entry {}: {}", key, err);
                None
            }
        }
    }

    async fn set(&self, key: &str, orders: &[Order]) -> Result<(), CacheError> {
        let payload = serde_json::to_string(orders)?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::backend)?;
        conn.set_ex::<_, _, ()>(key, payload, self.ttl_seconds)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::backend)?;
        conn.del::<_, ()>(key).await.map_err(CacheError::backend)?;
        Ok(())
    }
}
