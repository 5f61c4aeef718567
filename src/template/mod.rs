//! Template Module
//!
//! Typed template configuration, the document lifecycle, the rendering
//! backend seam and the bundled content builders.

mod backend;
pub mod builtin;
mod config;
mod document;
mod element;

pub use backend::{PageCallbacks, RenderBackend, RenderOutput, Surface, TextBackend};
pub use config::{ColorSpec, FontSpec, PageSize, TemplateConfig, TemplateConfigBuilder, Watermark, RESERVED_KEYS};
pub use document::{
    default_data_schema, BuildContext, DocumentTemplate, TemplateContent, TemplateState, DEFAULT_PREVIEW_PAGES,
    SLOW_BUILD_THRESHOLD,
};
pub use element::{DocumentElement, StyleSheet, TextStyle};
