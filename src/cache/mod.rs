//! Cache Module
//!
//! Provides the bounded in-memory TTL cache used for upstream responses and
//! as the hot mirror of the durable image cache.

mod entry;
mod fifo;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use fifo::FifoTracker;
pub use stats::CacheStats;
pub use store::ResponseCache;

// == Public Constants ==
/// Default bound on entries per cache
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default time-to-live in seconds
pub const DEFAULT_TTL_SECS: u64 = 300;
