//! Counters reported by the result cache, also exposed through `/stats`.

use serde::ser::{Serialize, SerializeStruct, Serializer};

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups that found nothing usable: absent, expired or undecodable.
    pub misses: u64,
    /// Entries removed to stay under `max_size_bytes`.
    pub evictions: u64,
    pub corrupted: u64,
    /// Blobs that could not be persisted and were skipped.
    pub write_failures: u64,
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
}

impl CacheStats {
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            max_size_bytes,
            ..Self::default()
        }
    }

    /// Share of lookups served from the cache; 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// An undecodable entry is dropped and the lookup counts as a miss.
    pub fn record_corruption(&mut self) {
        self.corrupted += 1;
        self.misses += 1;
    }

    pub fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }

    pub fn set_occupancy(&mut self, entries: usize, size_bytes: u64) {
        self.total_entries = entries;
        self.total_size_bytes = size_bytes;
    }
}

// Serialized with the derived `hit_rate` alongside the counters.
impl Serialize for CacheStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CacheStats", 9)?;
        state.serialize_field("hits", &self.hits)?;
        state.serialize_field("misses", &self.misses)?;
        state.serialize_field("hit_rate", &self.hit_rate())?;
        state.serialize_field("evictions", &self.evictions)?;
        state.serialize_field("corrupted", &self.corrupted)?;
        state.serialize_field("write_failures", &self.write_failures)?;
        state.serialize_field("total_entries", &self.total_entries)?;
        state.serialize_field("total_size_bytes", &self.total_size_bytes)?;
        state.serialize_field("max_size_bytes", &self.max_size_bytes)?;
        state.end()
    }
}
