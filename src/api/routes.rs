//! API Routes
//!
//! Configures the Axum router with all report engine endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    analytics_handler, batch_handler, clear_cache_handler, create_theme_handler, generate_handler,
    health_handler, preview_handler, schema_handler, stats_handler, templates_handler, theme_handler,
    AppState,
};

/// Builds the report engine router.
///
/// # Endpoints
/// - `POST /generate` - Generate a document (cached)
/// - `POST /preview` - Generate a truncated preview (never cached)
/// - `POST /batch` - Generate several documents into the output directory
/// - `GET /templates` - Kinds and their variants
/// - `GET /templates/:kind/schema` - Data schema for a kind
/// - `GET /analytics` - Template usage analytics
/// - `GET /stats` - Generation and cache statistics
/// - `DELETE /cache` - Drop every cached document
/// - `GET /themes/:name` - Resolve a theme
/// - `POST /themes` - Create and persist a custom theme
/// - `GET /health` - Health check endpoint
///
/// Every route runs behind a permissive CORS layer and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate", post(generate_handler))
        .route("/preview", post(preview_handler))
        .route("/batch", post(batch_handler))
        .route("/templates", get(templates_handler))
        .route("/templates/:kind/schema", get(schema_handler))
        .route("/analytics", get(analytics_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/themes", post(create_theme_handler))
        .route("/themes/:name", get(theme_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineContext, GenerationOrchestrator};
    use crate::template::builtin::standard_registry;
    use crate::template::TextBackend;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let engine = GenerationOrchestrator::new(
            standard_registry().unwrap(),
            None,
            Arc::new(TextBackend::new()),
            EngineContext::default(),
        );
        create_router(AppState::new(engine, std::env::temp_dir()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generate_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"kind":"session","data":{"title":"A"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_schema_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/templates/invoice/schema")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
