//! Cache Entry Module
//!
//! Defines a stored value together with the time it was written.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cached value and its write timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stored at the given instant.
    pub fn new(value: T, stored_at: u64) -> Self {
        Self { value, stored_at }
    }

    // == Freshness ==
    /// Checks whether the entry is still valid at `now`.
    ///
    /// An entry is valid iff `now - stored_at < ttl_ms`. Once the TTL has fully
    /// elapsed the entry is stale, so the boundary itself counts as stale.
    pub fn is_fresh_at(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.stored_at) < ttl_ms
    }

    /// Age of the entry in milliseconds at `now`.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as zero.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
