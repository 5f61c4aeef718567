//! API Handlers
//!
//! HTTP request handlers for each report engine endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::config::Config;
use crate::engine::{GenerationOrchestrator, GenerationReport, GenerationRequest, PerformanceStats};
use crate::error::{GenerationError, Result};
use crate::models::{
    BatchRequest, BatchResponse, ClearCacheResponse, CreateThemeRequest, HealthResponse, PreviewRequest,
    SchemaResponse, TemplatesResponse, ThemeQuery,
};
use crate::registry::UsageAnalytics;
use crate::style::Theme;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GenerationOrchestrator>,
    /// Directory batch jobs write into
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(engine: GenerationOrchestrator, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: Arc::new(engine),
            output_dir: output_dir.into(),
        }
    }

    /// Builds the orchestrator (cache, themes, bundled kinds) from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(GenerationOrchestrator::from_config(config)?, &config.output_dir))
    }

    fn document_response(&self, bytes: Vec<u8>, report: Option<&GenerationReport>) -> Response {
        let content_type = self.engine.backend().content_type().to_string();
        let mut headers = vec![(header::CONTENT_TYPE, content_type)];
        if let Some(report) = report {
            let cache = if report.cached { "HIT" } else { "MISS" };
            headers.push((HeaderName::from_static("x-cache"), cache.to_string()));
            headers.push((
                HeaderName::from_static("x-generation-time"),
                format!("{:.3}", report.time.as_secs_f64()),
            ));
            if let Some(pages) = report.pages {
                headers.push((HeaderName::from_static("x-pages"), pages.to_string()));
            }
        }

        let mut response = bytes.into_response();
        for (name, value) in headers {
            if let Ok(value) = value.parse() {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}

/// Handler for POST /generate
///
/// Returns the document bytes; cache status and timing travel in headers.
pub async fn generate_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> Result<Response> {
    let mut bytes = Vec::new();
    let report = state.engine.generate(&req, &mut bytes).await?;
    Ok(state.document_response(bytes, Some(&report)))
}

/// Handler for POST /preview
pub async fn preview_handler(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Response> {
    if let Some(error_msg) = req.validate() {
        return Err(GenerationError::InvalidRequest(error_msg));
    }

    let bytes = state.engine.generate_preview(&req.request, req.max_pages).await?;
    Ok(state.document_response(bytes, None))
}

/// Handler for POST /batch
///
/// Always 200: per-job failures are reported in the body.
pub async fn batch_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(GenerationError::InvalidRequest(error_msg));
    }

    let results = state.engine.batch_generate(&req.jobs, &state.output_dir).await;
    Ok(Json(BatchResponse::new(results)))
}

/// Handler for GET /templates
pub async fn templates_handler(State(state): State<AppState>) -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        kinds: state.engine.available_kinds(),
    })
}

/// Handler for GET /templates/:kind/schema
pub async fn schema_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<SchemaResponse>> {
    let schema = state.engine.data_schema(&kind)?;
    Ok(Json(SchemaResponse { kind, schema }))
}

/// Handler for GET /analytics
pub async fn analytics_handler(State(state): State<AppState>) -> Json<UsageAnalytics> {
    Json(state.engine.usage_analytics())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<PerformanceStats> {
    Json(state.engine.performance_stats().await)
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.engine.clear_cache().await;
    Json(ClearCacheResponse::new())
}

/// Handler for GET /themes/:name
///
/// Unknown names resolve to the default theme.
pub async fn theme_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ThemeQuery>,
) -> Json<Theme> {
    let styles = state.engine.context().styles();
    let theme = match query.kind {
        Some(kind) => styles.template_styles(&kind, &name),
        None => styles.theme(&name).clone(),
    };
    Json(theme)
}

/// Handler for POST /themes
pub async fn create_theme_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateThemeRequest>,
) -> Result<(StatusCode, Json<Theme>)> {
    if let Some(error_msg) = req.validate() {
        return Err(GenerationError::InvalidRequest(error_msg));
    }

    let theme = state.engine.context().styles_mut().create_custom_theme(
        &req.name,
        &req.palette,
        &req.font_family,
        req.layout,
    )?;
    Ok((StatusCode::CREATED, Json(theme)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
