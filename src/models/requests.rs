//! Request DTOs for the report engine API
//!
//! Generation requests reuse [`GenerationRequest`] directly; the types here
//! wrap it for the preview, batch and theme endpoints.

use serde::Deserialize;

use crate::engine::{DocumentJob, GenerationRequest};
use crate::style::LayoutOptions;

/// Upper bound on jobs accepted by one batch request
pub const MAX_BATCH_JOBS: usize = 100;

/// Request body for POST /preview
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub request: GenerationRequest,
    /// Page budget, defaults to the config's `max_preview_pages` or 3
    #[serde(default)]
    pub max_pages: Option<usize>,
}

impl PreviewRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.max_pages == Some(0) {
            return Some("max_pages must be at least 1".to_string());
        }
        None
    }
}

/// Request body for POST /batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub jobs: Vec<DocumentJob>,
}

impl BatchRequest {
    pub fn validate(&self) -> Option<String> {
        if self.jobs.is_empty() {
            return Some("Batch must contain at least one job".to_string());
        }
        if self.jobs.len() > MAX_BATCH_JOBS {
            return Some(format!("Batch exceeds maximum of {MAX_BATCH_JOBS} jobs"));
        }
        None
    }
}

/// Request body for POST /themes
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThemeRequest {
    pub name: String,
    #[serde(default = "default_palette")]
    pub palette: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub layout: Option<LayoutOptions>,
}

fn default_palette() -> String {
    "professional".to_string()
}

fn default_font_family() -> String {
    "modern".to_string()
}

impl CreateThemeRequest {
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Theme name cannot be empty".to_string());
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Some("Theme name may only contain letters, digits, '_' and '-'".to_string());
        }
        None
    }
}

/// Query for GET /themes/:name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeQuery {
    /// Adds the accent colours this kind uses
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_request_deserialize() {
        let json = r#"{"kind": "session", "data": {"title": "A"}, "max_pages": 2}"#;
        let req: PreviewRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.request.kind, "session");
        assert_eq!(req.max_pages, Some(2));
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_preview_rejects_zero_pages() {
        let req: PreviewRequest = serde_json::from_str(r#"{"kind": "session", "max_pages": 0}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_empty_batch_is_invalid() {
        let req: BatchRequest = serde_json::from_str(r#"{"jobs": []}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_theme_request_defaults() {
        let req: CreateThemeRequest = serde_json::from_str(r#"{"name": "studio"}"#).unwrap();
        assert_eq!(req.palette, "professional");
        assert_eq!(req.font_family, "modern");
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_theme_name_is_validated() {
        let req: CreateThemeRequest = serde_json::from_str(r#"{"name": "../etc"}"#).unwrap();
        assert!(req.validate().is_some());
    }
}
