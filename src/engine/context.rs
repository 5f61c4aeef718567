//! Shared engine state injected into orchestrators.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::style::StyleResolver;

// == Generation Stats ==
/// Counters for documents actually built (cache hits are not counted).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationStats {
    pub total_documents: u64,
    pub total_time: Duration,
}

impl GenerationStats {
    pub fn average_time(&self) -> Duration {
        if self.total_documents == 0 {
            return Duration::ZERO;
        }
        self.total_time.div_f64(self.total_documents as f64)
    }
}

// == Engine Context ==
/// Process-wide state: generation counters and the theme registry.
///
/// Clones share the same state; hand a clone to every orchestrator that
/// should report into the same counters.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    stats: Arc<Mutex<GenerationStats>>,
    styles: Arc<RwLock<StyleResolver>>,
}

impl EngineContext {
    pub fn new(styles: StyleResolver) -> Self {
        Self {
            stats: Arc::default(),
            styles: Arc::new(RwLock::new(styles)),
        }
    }

    pub fn record_generation(&self, elapsed: Duration) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.total_documents += 1;
        stats.total_time += elapsed;
    }

    pub fn generation_stats(&self) -> GenerationStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn styles(&self) -> RwLockReadGuard<'_, StyleResolver> {
        self.styles.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Single-writer access for theme creation.
    pub fn styles_mut(&self) -> RwLockWriteGuard<'_, StyleResolver> {
        self.styles.write().unwrap_or_else(PoisonError::into_inner)
    }
}
