//! Request and Response models for the report engine API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BatchRequest, CreateThemeRequest, PreviewRequest, ThemeQuery, MAX_BATCH_JOBS};
pub use responses::{BatchResponse, ClearCacheResponse, HealthResponse, SchemaResponse, TemplatesResponse};
