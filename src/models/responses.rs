//! Response DTOs for the report engine API
//!
//! Engine types that already serialize well (`PerformanceStats`,
//! `UsageAnalytics`, `Theme`) are returned as they are.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::engine::BatchResult;

/// Response body for GET /templates
#[derive(Debug, Clone, Serialize)]
pub struct TemplatesResponse {
    /// Kind -> variant names
    pub kinds: BTreeMap<String, Vec<String>>,
}

/// Response body for GET /templates/:kind/schema
#[derive(Debug, Clone, Serialize)]
pub struct SchemaResponse {
    pub kind: String,
    pub schema: Value,
}

/// Response body for POST /batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchResult>,
}

impl BatchResponse {
    pub fn new(results: Vec<BatchResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
}

impl ClearCacheResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

impl Default for ClearCacheResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    pub version: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_response_counts() {
        let results = vec![
            BatchResult::failed("a.txt".to_string(), "boom"),
            BatchResult::failed("b.txt".to_string(), "boom"),
        ];
        let resp = BatchResponse::new(results);
        assert_eq!((resp.total, resp.succeeded, resp.failed), (2, 0, 2));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_clear_cache_response() {
        let json = serde_json::to_value(ClearCacheResponse::new()).unwrap();
        assert_eq!(json["message"], "Cache cleared");
    }
}
