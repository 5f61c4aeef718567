//! Per-kind usage counters.

use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindUsage {
    pub kind: String,
    pub count: u64,
}

// == Usage Analytics ==
/// Snapshot of template usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageAnalytics {
    pub total_generations: u64,
    /// Counts in order of first use
    pub by_kind: IndexMap<String, u64>,
    /// First kind to reach the highest count
    pub most_used: Option<KindUsage>,
}

impl UsageAnalytics {
    pub fn from_counts(counts: &IndexMap<String, u64>) -> Self {
        let mut most_used: Option<KindUsage> = None;
        for (kind, count) in counts {
            if most_used.as_ref().map_or(true, |best| *count > best.count) {
                most_used = Some(KindUsage {
                    kind: kind.clone(),
                    count: *count,
                });
            }
        }

        Self {
            total_generations: counts.values().sum(),
            by_kind: counts.clone(),
            most_used,
        }
    }
}

// == Usage Tracker ==
/// Shared counter table. Clones share the same counts.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    counts: Arc<Mutex<IndexMap<String, u64>>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: &str) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, kind: &str) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get(kind).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> UsageAnalytics {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        UsageAnalytics::from_counts(&counts)
    }
}
