//! Time-boxed query cache
//!
//! Memoizes query results per key for a fixed TTL. Cached values are
//! snapshots: an entry older than the TTL is never served, and callers can
//! always bypass the cache with a fresh read.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::types::Result;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        entry.inserted_at.elapsed() < self.ttl
    }

    /// Cached value for `key`, `None` if missing or expired
    pub fn get(&self, key: &K) -> Option<V> {
        let cached = self
            .entries
            .get(key)
            .map(|entry| self.is_fresh(&entry).then(|| entry.value.clone()))?;
        if cached.is_none() {
            // Re-checked under the shard lock so a concurrent insert survives
            self.entries.remove_if(key, |_, entry| !self.is_fresh(entry));
        }
        cached
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Serve from cache or run `compute` and cache its result.
    /// Errors are returned to the caller and never cached.
    pub fn get_or_try_insert_with<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(hit) = self.get(&key) {
            debug!(?key, "cache hit");
            return Ok(hit);
        }
        debug!(?key, "cache miss");
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Recompute unconditionally and replace any cached value
    pub fn refresh_with<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop expired entries, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
