//! Batch job and result types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{GenerationReport, GenerationRequest};

// == Document Job ==
/// One batch entry: a request plus an optional output file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentJob {
    #[serde(flatten)]
    pub request: GenerationRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl DocumentJob {
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// File name inside the output directory. Path components are stripped
    /// and `.{extension}` is appended to names without one; missing or
    /// unusable names become `document_{index}.{extension}`.
    pub fn output_filename(&self, index: usize, extension: &str) -> String {
        match self
            .filename
            .as_deref()
            .map(sanitize_filename)
            .filter(|name| !name.is_empty() && !name.starts_with('.'))
        {
            Some(name) if Path::new(&name).extension().is_some_and(|ext| !ext.is_empty()) => name,
            Some(name) => format!("{name}.{extension}"),
            None => format!("document_{index}.{extension}"),
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

// == Batch Result ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub report: Option<GenerationReport>,
}

impl BatchResult {
    pub fn succeeded(filename: String, path: PathBuf, report: GenerationReport) -> Self {
        Self {
            filename,
            success: true,
            path: Some(path),
            error: None,
            report: Some(report),
        }
    }

    pub fn failed(filename: String, error: impl ToString) -> Self {
        Self {
            filename,
            success: false,
            path: None,
            error: Some(error.to_string()),
            report: None,
        }
    }
}
