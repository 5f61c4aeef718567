//! Cache Key Module
//!
//! Deterministic content addressing for (kind, data, config) triples.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// == Cache Key ==
/// Hex SHA-256 digest identifying one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Computes `hash(hash(kind) : hash(canonical(data)) : hash(canonical(config)))`.
    ///
    /// Object key order never affects the result; array order does.
    pub fn compute(kind: &str, data: &Value, config: &Value) -> Self {
        let kind_hash = sha256_hex(kind.as_bytes());
        let data_hash = sha256_hex(canonical_json(data).as_bytes());
        let config_hash = sha256_hex(canonical_json(config).as_bytes());

        let combined = format!("{kind_hash}:{data_hash}:{config_hash}");
        Self(sha256_hex(combined.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Canonical JSON ==
/// Serializes a value with object keys sorted at every depth.
///
/// Does not rely on serde_json's map ordering, which changes with the
/// `preserve_order` feature.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map.iter().collect(), out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Writes object entries sorted by key, whatever order they arrive in.
pub(crate) fn write_object(mut entries: Vec<(&String, &Value)>, out: &mut String) {
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
