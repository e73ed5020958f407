//! Time-boxed key/value cache with lazy eviction.

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

/// A cached value with its insertion time and lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// An entry is logically absent once strictly more than `ttl` has passed.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) > self.ttl
    }
}

/// A thread-safe cache whose entries expire after a per-entry TTL.
///
/// Expired entries are removed lazily by `get`/`has`; there is no background
/// sweep. `size` therefore counts entries that have expired but were not read
/// since.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    inner: DashMap<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: DashMap::new(),
            default_ttl,
        }
    }

    /// Insert or replace `key`. `ttl` falls back to the instance default.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        self.inner.insert(
            key,
            CacheEntry {
                data: value,
                timestamp: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    /// Get a live value, evicting it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let hit = match self.inner.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.data.clone()),
            Some(_) => None,
            None => {
                metrics::record_cache_lookup(false);
                return None;
            }
        };

        // The shard guard above is released before removing
        if hit.is_none() {
            self.inner.remove_if(key, |_, entry| entry.is_expired(now));
        }
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Whether a live value exists for `key`.
    pub fn has(&self, key: &K) -> bool {
        let now = Instant::now();
        let expired = match self.inner.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if expired {
            self.inner.remove_if(key, |_, entry| entry.is_expired(now));
        }
        !expired
    }

    /// Remove `key`, returning whether it was present.
    pub fn delete(&self, key: &K) -> bool {
        self.inner.remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn size(&self) -> usize {
        self.inner.len()
    }

    /// Default TTL applied when `set` gets no override.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the cached value or fetch, store and return a fresh one.
    ///
    /// Fetch errors are returned as-is and nothing is cached.
    pub async fn get_or_try_fetch<F, Fut, E>(
        &self,
        key: K,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}
