use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use rolegate_application::KeyValueCache;
use rolegate_core::AppResult;

/// In-memory decision cache backend with per-entry expiry.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl InMemoryKeyValueCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, expired ones excluded.
    pub async fn live_entries(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired(now)).count()
    }
}

#[async_trait]
impl KeyValueCache for InMemoryKeyValueCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn list_keys_by_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache = InMemoryKeyValueCache::new();
        let set = cache.set("ns:perm:1:x", "allow", Duration::ZERO).await;
        assert!(set.is_ok());

        let value = cache.get("ns:perm:1:x").await;
        assert!(matches!(value, Ok(None)));
        assert_eq!(cache.live_entries().await, 0);
    }

    #[tokio::test]
    async fn prefix_listing_is_exact() {
        let cache = InMemoryKeyValueCache::new();
        for key in ["ns:perm:1:a", "ns:perm:1:b", "ns:perm:12:a", "ns:perm:2:a"] {
            let set = cache.set(key, "deny", Duration::from_secs(60)).await;
            assert!(set.is_ok());
        }

        let keys = cache.list_keys_by_prefix("ns:perm:1:").await;
        let mut keys = keys.unwrap_or_default();
        keys.sort();
        assert_eq!(keys, vec!["ns:perm:1:a", "ns:perm:1:b"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let cache = InMemoryKeyValueCache::new();
        assert!(cache.delete("absent").await.is_ok());

        let set = cache.set("present", "allow", Duration::from_secs(60)).await;
        assert!(set.is_ok());
        assert!(cache.delete("present").await.is_ok());
        assert!(matches!(cache.get("present").await, Ok(None)));
    }
}
