//! Cache Module
//!
//! Provides the disk-backed result cache with TTL expiration and LRU
//! eviction, plus deterministic cache keys.

mod clock;
mod entry;
mod key;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{canonical_json, CacheKey};
pub use stats::CacheStats;
pub use store::ResultCache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
