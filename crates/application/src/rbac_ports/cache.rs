use std::time::Duration;

use async_trait::async_trait;
use rolegate_core::AppResult;

/// Backend port for the decision cache. Implementations map backend
/// failures to `AppError::CacheUnavailable`; callers absorb those failures
/// and fall back to the store, so the backend is purely an optimization.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns the value stored under a key, if present and unexpired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a value under a key with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Deletes one key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Lists every key starting with the given prefix. Used for prefix
    /// invalidation; a brief staleness window between listing and deleting
    /// is acceptable.
    async fn list_keys_by_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;
}
