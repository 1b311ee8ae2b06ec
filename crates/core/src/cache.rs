//! Time-boxed in-memory cache for computed responses.
//!
//! Entries are immutable once written and expire by TTL; there is no explicit
//! invalidation and no size bound.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::CACHE_LOOKUPS;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed cache with a default time-to-live.
pub struct ResponseCache<V> {
    name: String,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create an empty cache. `name` labels its metrics.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let found = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => Some(Some(entry.value.clone())),
                Some(_) => Some(None),
                None => None,
            }
        };

        let value = match found {
            Some(Some(value)) => Some(value),
            Some(None) => {
                // Expired: drop it unless a writer refreshed it meanwhile.
                let mut entries = self.entries.write().await;
                if entries.get(key).is_some_and(|e| e.expires_at <= now) {
                    entries.remove(key);
                }
                None
            }
            None => None,
        };

        let result = if value.is_some() { "hit" } else { "miss" };
        CACHE_LOOKUPS
            .with_label_values(&[self.name.as_str(), result])
            .inc();
        debug!(cache = %self.name, key = %key, result, "Cache lookup");

        value
    }

    /// Store a value under the default TTL.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.ttl).await;
    }

    /// Store a value with an explicit TTL.
    pub async fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_inserted_value() {
        let cache = ResponseCache::new("test", Duration::from_secs(60));
        assert!(cache.get("k").await.is_none());

        cache.insert("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = ResponseCache::new("test", Duration::from_secs(60));
        cache
            .insert_with_ttl("short", 1u32, Duration::from_millis(20))
            .await;
        cache.insert("long", 2u32).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await, Some(2));
        // expired lookup removed the entry
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = ResponseCache::new("test", Duration::from_millis(20));
        cache.insert("a", 1u32).await;
        cache.insert("b", 2u32).await;
        cache
            .insert_with_ttl("c", 3u32, Duration::from_secs(60))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.len().await, 1);
        assert!(!cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_value() {
        let cache = ResponseCache::new("test", Duration::from_secs(60));
        cache.insert("k", 1u32).await;
        cache.insert("k", 2u32).await;
        assert_eq!(cache.get("k").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }
}
