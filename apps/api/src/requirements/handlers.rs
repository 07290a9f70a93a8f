//! Axum route handlers for the Requirements API.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::requirements::normalizer::{normalize, HeadingOverrides};
use crate::requirements::Requirements;

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub requirements: Requirements,
    #[serde(default)]
    pub overrides: HeadingOverrides,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub requirements: Requirements,
}

/// POST /api/v1/requirements/normalize
///
/// Re-applies heading overrides and defaults to an already extracted
/// requirements object.
pub async fn handle_normalize(
    Json(request): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, AppError> {
    Ok(Json(NormalizeResponse {
        requirements: normalize(request.requirements, &request.overrides),
    }))
}
