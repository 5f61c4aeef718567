//! Registry Module
//!
//! Kind -> template registration, variant and brand layering, fallback
//! chains and usage analytics.

mod analytics;
mod kinds;

pub use analytics::{KindUsage, UsageAnalytics, UsageTracker};
pub use kinds::{TemplateRegistry, DEFAULT_VARIANT};
