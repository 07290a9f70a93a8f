//! Axum route handlers for the Analysis API.

use axum::Json;
use serde::Deserialize;

use crate::analysis::{analyze, AnalysisReport, ContentKind};
use crate::errors::AppError;
use crate::requirements::Requirements;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
    pub requirements: Requirements,
    #[serde(default)]
    pub content_kind: ContentKind,
}

/// POST /api/v1/content/analyze
///
/// Deterministic compliance report. No completion calls.
pub async fn handle_analyze(
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    Ok(Json(analyze(
        &request.content,
        &request.requirements,
        request.content_kind,
    )))
}
