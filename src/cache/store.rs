//! Response Cache Module
//!
//! Bounded TTL cache combining HashMap storage with FIFO eviction.

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, FifoTracker};

// == Response Cache ==
/// In-memory TTL cache with a fixed entry bound.
///
/// Stale entries are treated as misses but stay in place; only the size
/// bound in [`ResponseCache::set`] removes entries. Eviction order is
/// insertion order, not access order.
#[derive(Debug)]
pub struct ResponseCache<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Insertion order tracker
    order: FifoTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Time-to-live in milliseconds
    ttl_ms: u64,
}

impl<T: Clone> ResponseCache<T> {
    // == Constructor ==
    /// Creates a cache holding at most `max_entries` values for `ttl_secs` each.
    pub fn new(max_entries: usize, ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: FifoTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl_ms: ttl_secs.saturating_mul(1000),
        }
    }

    // == Get ==
    /// Returns the value for `key` if it was stored less than TTL ago.
    pub fn get(&mut self, key: &str) -> Option<T> {
        self.get_at(key, current_timestamp_ms())
    }

    /// [`ResponseCache::get`] evaluated at an explicit instant.
    pub fn get_at(&mut self, key: &str, now: u64) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now, self.ttl_ms) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                self.stats.record_stale_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// An overwrite refreshes the timestamp but keeps the key's original
    /// insertion position. When the insert grows the cache past its bound the
    /// oldest inserted key is evicted.
    pub fn set(&mut self, key: String, value: T) {
        self.set_at(key, value, current_timestamp_ms());
    }

    /// [`ResponseCache::set`] evaluated at an explicit instant.
    pub fn set_at(&mut self, key: String, value: T, now: u64) {
        let entry = CacheEntry::new(value, now);
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push(&key);
        }

        if self.entries.len() > self.max_entries {
            if let Some(evicted_key) = self.order.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
            }
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Clear ==
    /// Removes every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Contains ==
    /// Whether `key` is present, fresh or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
