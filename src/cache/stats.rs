//! Cache Statistics Module
//!
//! Read and eviction counters for a [`ResponseCache`](super::ResponseCache).
//! A read that finds an entry older than the TTL is a miss, but it is also
//! counted on its own so `/api/stats` shows how much traffic lands on
//! entries that are still held yet too old to serve.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,
    /// Reads not served, whether the key was absent or stale
    pub misses: u64,
    /// Subset of `misses` where the key was present but past its TTL
    pub stale_misses: u64,
    /// Entries dropped by the size bound
    pub evictions: u64,
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Ratios ==
    /// hits / (hits + misses), 0.0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }

    /// Share of misses caused by expiry rather than an absent key.
    pub fn stale_ratio(&self) -> f64 {
        match self.misses {
            0 => 0.0,
            misses => self.stale_misses as f64 / misses as f64,
        }
    }

    // == Recording ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_stale_miss(&mut self) {
        self.misses += 1;
        self.stale_misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_before_any_read() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.stale_ratio(), 0.0);
    }

    #[test]
    fn test_stale_miss_counts_as_miss() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_stale_miss();
        stats.record_miss();
        stats.record_miss();

        assert_eq!(stats.misses, 3);
        assert_eq!(stats.stale_misses, 1);
        assert_eq!(stats.hit_rate(), 0.25);
        assert!((stats.stale_ratio() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_evictions_independent_of_reads() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_eviction();

        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
