//! Report Engine - document generation with a disk-backed result cache
//!
//! Turns a document kind plus structured client data into rendered bytes.
//! Templates are resolved through a registry of kinds and named variants,
//! styled from themes and brand layers, built off the async executor and
//! cached by a deterministic key with TTL expiry and LRU eviction.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod style;
pub mod tasks;
pub mod template;

pub use api::AppState;
pub use cache::{CacheKey, CacheStats, ResultCache};
pub use config::Config;
pub use engine::{BatchResult, DocumentJob, EngineContext, GenerationOrchestrator, GenerationReport, GenerationRequest};
pub use error::{GenerationError, Result};
pub use registry::TemplateRegistry;
pub use style::{BrandConfig, StyleResolver, Theme};
pub use tasks::spawn_cleanup_task;
pub use template::{DocumentElement, DocumentTemplate, RenderBackend, TemplateConfig, TemplateContent, TextBackend};
