//! Redis-backed decision cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use rolegate_application::KeyValueCache;
use rolegate_core::{AppError, AppResult};

/// Redis implementation of the decision cache backend port. All failures
/// surface as `CacheUnavailable` so the resolver can absorb them and fall
/// back to the store.
#[derive(Clone)]
pub struct RedisDecisionCache {
    client: redis::Client,
}

impl RedisDecisionCache {
    /// Creates a cache adapter with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::CacheUnavailable(format!("failed to connect to redis: {error}"))
            })
    }
}

#[async_trait]
impl KeyValueCache for RedisDecisionCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        connection.get(key).await.map_err(|error| {
            AppError::CacheUnavailable(format!("failed to read cache entry: {error}"))
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let seconds = ttl.as_secs().max(1);
        let mut connection = self.connection().await?;
        connection
            .set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|error| {
                AppError::CacheUnavailable(format!("failed to write cache entry: {error}"))
            })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection.del::<_, ()>(key).await.map_err(|error| {
            AppError::CacheUnavailable(format!("failed to delete cache entry: {error}"))
        })
    }

    async fn list_keys_by_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut connection = self.connection().await?;
        let pattern = format!("{prefix}*");
        let mut keys = Vec::new();
        let mut iter = connection
            .scan_match::<_, String>(&pattern)
            .await
            .map_err(|error| {
                AppError::CacheUnavailable(format!("failed to scan cache keys: {error}"))
            })?;
        while let Some(key) = iter.next_item().await.transpose().map_err(|error| {
            AppError::CacheUnavailable(format!("failed to scan cache keys: {error}"))
        })? {
            keys.push(key);
        }

        Ok(keys)
    }
}
