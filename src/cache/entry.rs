//! Cache Entry Module
//!
//! Defines the persisted index metadata for a cached document and the
//! on-disk blob record that carries its bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Index metadata for one cached document.
///
/// Timestamps are Unix milliseconds. The bytes themselves live in the blob
/// file, so the index stays small enough to rewrite on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Creation timestamp
    pub created_at: u64,
    /// Last successful read (or creation) timestamp, drives LRU
    pub accessed_at: u64,
    /// Expiration timestamp
    pub expires_at: u64,
    /// Content size in bytes
    pub size: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates metadata for content stored at `now` with the given TTL.
    pub fn new(now_ms: u64, ttl_ms: u64, size: u64) -> Self {
        Self {
            created_at: now_ms,
            accessed_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            size,
        }
    }

    // == Is Expired ==
    /// An entry is expired strictly after its expiration timestamp.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Blob Record ==
/// Serialized form of a blob file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRecord {
    /// Base64 encoded document bytes
    pub content: String,
    pub created_at: u64,
    pub ttl_ms: u64,
    pub size: u64,
}

impl BlobRecord {
    pub fn new(content: &[u8], created_at: u64, ttl_ms: u64) -> Self {
        Self {
            content: STANDARD.encode(content),
            created_at,
            ttl_ms,
            size: content.len() as u64,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a blob file, returning None for anything undecodable.
    pub fn decode(raw: &[u8]) -> Option<Vec<u8>> {
        let record: BlobRecord = serde_json::from_slice(raw).ok()?;
        let content = STANDARD.decode(record.content.as_bytes()).ok()?;
        (content.len() as u64 == record.size).then_some(content)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(1_000, 500, 42);

        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.accessed_at, 1_000);
        assert_eq!(entry.expires_at, 1_500);
        assert_eq!(entry.size, 42);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(1_000, 500, 1);

        // Exactly at expires_at the entry is still live
        assert!(!entry.is_expired_at(1_500));
        assert!(entry.is_expired_at(1_501));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(1_000, 500, 1);

        assert_eq!(entry.ttl_remaining_ms(1_200), 300);
        assert_eq!(entry.ttl_remaining_ms(2_000), 0);
    }

    #[test]
    fn test_index_uses_camel_case_fields() {
        let json = serde_json::to_value(CacheEntry::new(1, 2, 3)).unwrap();
        assert_eq!(json["createdAt"], 1);
        assert_eq!(json["accessedAt"], 1);
        assert_eq!(json["expiresAt"], 3);
        assert_eq!(json["size"], 3);
    }

    #[test]
    fn test_blob_decode() {
        let raw = BlobRecord::new(b"%PDF-1.4 body", 10, 20).to_bytes().unwrap();
        assert_eq!(BlobRecord::decode(&raw).unwrap(), b"%PDF-1.4 body".to_vec());
    }

    #[test]
    fn test_blob_decode_rejects_garbage() {
        assert!(BlobRecord::decode(b"not json at all").is_none());
        assert!(BlobRecord::decode(br#"{"content":"***","createdAt":0,"ttlMs":0,"size":1}"#).is_none());
    }

    #[test]
    fn test_blob_decode_rejects_size_mismatch() {
        let mut record = BlobRecord::new(b"abc", 0, 0);
        record.size = 99;
        let raw = record.to_bytes().unwrap();
        assert!(BlobRecord::decode(&raw).is_none());
    }
}
