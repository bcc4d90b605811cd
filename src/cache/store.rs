//! Cache Store Module
//!
//! Main cache engine: HashMap storage with lazy TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats};

/// Cache shared between request handlers and the sweep task.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

// == Cache Store ==
/// In-memory TTL cache.
///
/// Reads re-check freshness on every call and evict stale entries as a side
/// effect, so correctness never depends on the background sweep.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Wraps a fresh store for sharing across tasks.
    pub fn shared() -> SharedCache<V> {
        Arc::new(RwLock::new(Self::new()))
    }

    // == Set ==
    /// Stores a value under `key` for `ttl_seconds`.
    ///
    /// If the key already exists, the value is overwritten and TTL is reset.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_seconds: u64) {
        self.set_at(key, value, ttl_seconds, Instant::now());
    }

    pub fn set_at(&mut self, key: impl Into<String>, value: V, ttl_seconds: u64, now: Instant) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, ttl_seconds, now));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        self.misses += 1;
        None
    }

    // == Has ==
    /// True when `key` holds a fresh value. Evicts stale entries like `get`.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Stats ==
    /// Returns current size, sorted keys and hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            size: self.entries.len(),
            keys,
            hits: self.hits,
            misses: self.misses,
        }
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
