//! Result Cache Module
//!
//! Disk-backed, content-addressed store for generated documents. One blob
//! file per key plus a JSON index that is rewritten on every mutation, with
//! TTL expiry and size-bounded LRU eviction.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::entry::BlobRecord;
use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, MAX_KEY_LENGTH};
use crate::error::Result;

const INDEX_FILE: &str = "index.json";
const BLOB_EXTENSION: &str = "cache";
const TEMP_EXTENSION: &str = "tmp";

// == Result Cache ==
/// Disk-persisted byte-blob cache with TTL and LRU eviction.
///
/// Single-writer: the index file is rewritten without locking, so only one
/// process may own a cache directory at a time.
#[derive(Debug)]
pub struct ResultCache {
    /// Directory holding blobs and the index
    dir: PathBuf,
    /// In-memory mirror of the index file
    index: BTreeMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Size limit for cached content
    max_size_bytes: u64,
    /// TTL applied when `set` gets none
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    // == Constructor ==
    /// Opens (or creates) a cache directory and rebuilds the index from disk.
    pub fn open(dir: impl Into<PathBuf>, max_size_bytes: u64, default_ttl: Duration) -> Result<Self> {
        Self::open_with_clock(dir, max_size_bytes, default_ttl, Arc::new(SystemClock))
    }

    /// Same as [`ResultCache::open`] with an explicit time source.
    pub fn open_with_clock(
        dir: impl Into<PathBuf>,
        max_size_bytes: u64,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let index = load_index(&dir);

        let mut cache = Self {
            dir,
            index,
            stats: CacheStats::new(max_size_bytes),
            max_size_bytes,
            default_ttl,
            clock,
        };
        cache.refresh_occupancy();
        debug!(
            dir = %cache.dir.display(),
            entries = cache.index.len(),
            "Result cache opened"
        );
        Ok(cache)
    }

    // == Get ==
    /// Returns the cached bytes for `key`.
    ///
    /// Absent, expired and undecodable entries are all misses. Expired and
    /// undecodable entries are removed on the way out; nothing here fails.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        if !is_valid_key(key) {
            self.stats.record_miss();
            return None;
        }

        let Some(entry) = self.index.get(key).copied() else {
            self.stats.record_miss();
            debug!(key, "Cache miss");
            return None;
        };

        let now = self.clock.now_ms();
        if entry.is_expired_at(now) {
            self.remove_entry(key);
            self.stats.record_miss();
            debug!(key, "Cache entry expired");
            return None;
        }

        let content = fs::read(self.blob_path(key))
            .ok()
            .and_then(|raw| BlobRecord::decode(&raw));

        let Some(content) = content else {
            warn!(key, "Discarding undecodable cache entry");
            self.remove_entry(key);
            self.stats.record_corruption();
            return None;
        };

        if let Some(entry) = self.index.get_mut(key) {
            entry.accessed_at = now;
        }
        self.save_index();
        self.stats.record_hit();
        debug!(key, size = content.len(), "Cache hit");
        Some(content)
    }

    // == Set ==
    /// Stores `content` under `key`, evicting least recently used entries
    /// first if the size limit would be exceeded.
    ///
    /// A blob that cannot be persisted is dropped: the call logs, counts a
    /// write failure and otherwise behaves as a no-op.
    pub fn set(&mut self, key: &str, content: &[u8], ttl: Option<Duration>) {
        if !is_valid_key(key) {
            warn!(key, "Refusing to cache under an invalid key");
            return;
        }

        let size = content.len() as u64;
        if size > self.max_size_bytes {
            debug!(key, size, max = self.max_size_bytes, "Content larger than cache, not cached");
            return;
        }

        let replaced = self.index.get(key).map_or(0, |entry| entry.size);
        let projected = self.total_size() - replaced + size;
        if projected > self.max_size_bytes {
            self.evict_lru(projected - self.max_size_bytes, key);
        }

        let now = self.clock.now_ms();
        let ttl_ms = ttl.unwrap_or(self.default_ttl).as_millis() as u64;

        if let Err(err) = self.write_blob(key, &BlobRecord::new(content, now, ttl_ms)) {
            warn!(key, error = %err, "Failed to persist cache entry, dropping it");
            self.stats.record_write_failure();
            return;
        }

        self.index.insert(key.to_string(), CacheEntry::new(now, ttl_ms, size));
        self.save_index();
        self.refresh_occupancy();
        debug!(key, size, ttl_ms, "Cache entry stored");
    }

    // == Delete ==
    /// Removes an entry. Returns false if there was nothing to remove.
    pub fn delete(&mut self, key: &str) -> bool {
        is_valid_key(key) && self.remove_entry(key)
    }

    // == Clear ==
    /// Drops every entry and blob.
    pub fn clear(&mut self) {
        if let Ok(dir) = fs::read_dir(&self.dir) {
            for path in dir.flatten().map(|e| e.path()) {
                let ext = path.extension().and_then(|e| e.to_str());
                if matches!(ext, Some(BLOB_EXTENSION) | Some(TEMP_EXTENSION)) {
                    if let Err(err) = fs::remove_file(&path) {
                        warn!(path = %path.display(), error = %err, "Failed to remove cache file");
                    }
                }
            }
        }

        self.index.clear();
        self.save_index();
        self.refresh_occupancy();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .index
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired.iter().filter(|key| self.remove_entry(key)).count()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Index metadata for a key, if present.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.index.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total size of cached content in bytes.
    pub fn total_size(&self) -> u64 {
        self.index.values().map(|entry| entry.size).sum()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // == Internals ==
    /// Evicts by ascending access time (ties by key) until `needed` bytes are
    /// freed or nothing evictable is left. `protect` is never evicted.
    fn evict_lru(&mut self, needed: u64, protect: &str) {
        let mut candidates: Vec<(String, CacheEntry)> = self
            .index
            .iter()
            .filter(|(key, _)| key.as_str() != protect)
            .map(|(key, entry)| (key.clone(), *entry))
            .collect();
        candidates.sort_by(|(ka, a), (kb, b)| a.accessed_at.cmp(&b.accessed_at).then_with(|| ka.cmp(kb)));

        let mut freed = 0;
        for (key, entry) in candidates {
            if freed >= needed {
                break;
            }
            if self.remove_entry(&key) {
                freed += entry.size;
                self.stats.record_eviction();
                debug!(key = %key, size = entry.size, "Evicted least recently used entry");
            }
        }
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let path = self.blob_path(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(key, error = %err, "Failed to remove cache blob");
            }
        }

        let removed = self.index.remove(key).is_some();
        if removed {
            self.save_index();
            self.refresh_occupancy();
        }
        removed
    }

    fn write_blob(&self, key: &str, record: &BlobRecord) -> io::Result<()> {
        let bytes = record.to_bytes().map_err(io::Error::other)?;
        let tmp = self.dir.join(format!("{key}.{BLOB_EXTENSION}.{TEMP_EXTENSION}"));

        let written = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, self.blob_path(key)));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }

    fn save_index(&self) {
        let path = self.dir.join(INDEX_FILE);
        let written = serde_json::to_vec_pretty(&self.index)
            .map_err(io::Error::other)
            .and_then(|bytes| fs::write(&path, bytes));
        if let Err(err) = written {
            warn!(path = %path.display(), error = %err, "Failed to write cache index");
        }
    }

    fn refresh_occupancy(&mut self) {
        let size = self.total_size();
        self.stats.set_occupancy(self.index.len(), size);
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{BLOB_EXTENSION}"))
    }
}

/// Keys become file names, so they are restricted to a safe alphabet.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn load_index(dir: &Path) -> BTreeMap<String, CacheEntry> {
    let path = dir.join(INDEX_FILE);
    match fs::read(&path) {
        Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "Unreadable cache index, starting empty");
            BTreeMap::new()
        }),
        Err(_) => BTreeMap::new(),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use tempfile::TempDir;

    const TTL: Duration = Duration::from_secs(60);

    fn open(dir: &TempDir, max: u64) -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = ResultCache::open_with_clock(dir.path(), max, TTL, clock.clone()).unwrap();
        (cache, clock)
    }

    #[test]
    fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        cache.set("key1", b"document", None);

        assert_eq!(cache.get("key1").unwrap(), b"document".to_vec());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        assert!(cache.get("nonexistent").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_ttl_expiration_removes_entry() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 1024);

        cache.set("key1", b"document", Some(Duration::from_secs(1)));
        clock.advance(Duration::from_millis(1_000));
        assert!(cache.get("key1").is_some(), "still live at expires_at");

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("key1").is_none());
        assert!(!cache.contains_key("key1"));
        assert!(!dir.path().join("key1.cache").exists());
    }

    #[test]
    fn test_lru_eviction_by_access_time() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 300);

        for key in ["entry1", "entry2", "entry3"] {
            cache.set(key, &[0u8; 100], None);
            clock.advance(Duration::from_millis(10));
        }
        cache.set("entry4", &[0u8; 100], None);

        assert!(!cache.contains_key("entry1"));
        assert!(cache.contains_key("entry2"));
        assert!(cache.contains_key("entry3"));
        assert!(cache.contains_key("entry4"));
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.total_size(), 300);
    }

    #[test]
    fn test_get_refreshes_access_time() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 300);

        for key in ["entry1", "entry2", "entry3"] {
            cache.set(key, &[0u8; 100], None);
            clock.advance(Duration::from_millis(10));
        }
        cache.get("entry1").unwrap();
        clock.advance(Duration::from_millis(10));
        cache.set("entry4", &[0u8; 100], None);

        assert!(cache.contains_key("entry1"));
        assert!(!cache.contains_key("entry2"));
    }

    #[test]
    fn test_eviction_frees_enough_for_large_entry() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 300);

        for key in ["entry1", "entry2", "entry3"] {
            cache.set(key, &[0u8; 100], None);
            clock.advance(Duration::from_millis(10));
        }
        cache.set("big", &[0u8; 250], None);

        assert_eq!(cache.stats().evictions, 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("big"));
    }

    #[test]
    fn test_overwrite_does_not_evict_itself() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 200);

        cache.set("entry1", &[1u8; 100], None);
        clock.advance(Duration::from_millis(10));
        cache.set("entry2", &[2u8; 100], None);
        clock.advance(Duration::from_millis(10));
        cache.set("entry1", &[3u8; 100], None);

        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get("entry1").unwrap(), vec![3u8; 100]);
    }

    #[test]
    fn test_oversized_content_not_cached() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 100);

        cache.set("small", &[0u8; 50], None);
        cache.set("huge", &[0u8; 101], None);

        assert!(!cache.contains_key("huge"));
        assert!(cache.contains_key("small"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_corrupt_blob_self_heals() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        cache.set("key1", b"document", None);
        fs::write(dir.path().join("key1.cache"), b"garbage").unwrap();

        assert!(cache.get("key1").is_none());
        assert!(!cache.contains_key("key1"));
        let stats = cache.stats();
        assert_eq!(stats.corrupted, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_missing_blob_self_heals() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        cache.set("key1", b"document", None);
        fs::remove_file(dir.path().join("key1.cache")).unwrap();

        assert!(cache.get("key1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persistence_failure_is_silent_noop() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        // A directory where the blob should go makes the final rename fail
        fs::create_dir(dir.path().join("key1.cache")).unwrap();
        cache.set("key1", b"document", None);

        assert!(!cache.contains_key("key1"));
        assert_eq!(cache.stats().write_failures, 1);
        assert!(!dir.path().join("key1.cache.tmp").exists());
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 1024);
        cache.set("key1", b"document", None);
        let entry = *cache.entry("key1").unwrap();
        drop(cache);

        let mut reopened =
            ResultCache::open_with_clock(dir.path(), 1024, TTL, clock.clone()).unwrap();
        assert_eq!(reopened.entry("key1"), Some(&entry));
        assert_eq!(reopened.stats().total_size_bytes, 8);
        assert_eq!(reopened.get("key1").unwrap(), b"document".to_vec());
    }

    #[test]
    fn test_unreadable_index_starts_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(INDEX_FILE), b"{ not json").unwrap();

        let (cache, _) = open(&dir, 1024);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        cache.set("key1", b"document", None);
        assert!(cache.delete("key1"));
        assert!(!cache.delete("key1"));
        assert!(cache.get("key1").is_none());
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        cache.set("key1", b"one", None);
        cache.set("key2", b"two", None);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_size_bytes, 0);
        assert!(!dir.path().join("key1.cache").exists());
        assert!(dir.path().join(INDEX_FILE).exists());
    }

    #[test]
    fn test_cleanup_expired() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open(&dir, 1024);

        cache.set("short", b"one", Some(Duration::from_secs(1)));
        cache.set("long", b"two", Some(Duration::from_secs(10)));
        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn test_invalid_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open(&dir, 1024);

        cache.set("../escape", b"x", None);
        cache.set(&"x".repeat(MAX_KEY_LENGTH + 1), b"x", None);

        assert!(cache.is_empty());
        assert!(cache.get("../escape").is_none());
    }
}
