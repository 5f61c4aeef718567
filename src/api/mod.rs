//! API Module
//!
//! HTTP handlers and routing exposing the generation orchestrator.
//!
//! # Endpoints
//! - `POST /generate`, `POST /preview`, `POST /batch` - Document generation
//! - `GET /templates`, `GET /templates/:kind/schema` - Registry introspection
//! - `GET /analytics`, `GET /stats`, `DELETE /cache` - Usage and cache
//! - `GET /themes/:name`, `POST /themes` - Themes
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
