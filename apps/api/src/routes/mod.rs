pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::generation::handlers as content;
use crate::report::handlers as report;
use crate::requirements::handlers as requirements;
use crate::state::AppState;

/// Largest accepted request body (workbook uploads).
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Report ingestion
        .route("/api/v1/reports/extract", post(report::handle_extract))
        .route(
            "/api/v1/requirements/normalize",
            post(requirements::handle_normalize),
        )
        // Content API
        .route("/api/v1/content/prompt", post(content::handle_prompt))
        .route("/api/v1/content/generate", post(content::handle_generate))
        .route("/api/v1/content/analyze", post(analysis::handle_analyze))
        .route("/api/v1/content/validate", post(content::handle_validate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
