//! Engine Module
//!
//! The generation orchestrator and the shared state it reports into.

mod batch;
mod context;
mod orchestrator;

pub use batch::{BatchResult, DocumentJob};
pub use context::{EngineContext, GenerationStats};
pub use orchestrator::{GenerationOrchestrator, GenerationReport, GenerationRequest, PerformanceStats};
