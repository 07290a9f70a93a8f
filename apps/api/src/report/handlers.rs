//! Axum route handlers for report ingestion.

use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::report::extractor::extract;
use crate::requirements::models::HeadingLevel;
use crate::requirements::normalizer::{normalize, HeadingOverrides};
use crate::requirements::Requirements;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub filename: Option<String>,
    pub requirements: Requirements,
}

/// Upload fields other than the file itself.
#[derive(Debug, Default)]
struct UploadForm {
    filename: Option<String>,
    bytes: Option<Vec<u8>>,
    overrides: HeadingOverrides,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/reports/extract
///
/// Multipart form: `file` (the CORA workbook) plus optional `h2`..`h6`
/// heading overrides. Returns the normalized requirements.
pub async fn handle_extract(multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let form = read_form(multipart).await?;
    let bytes = form
        .bytes
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    info!(
        "Extracting report {:?} ({} bytes)",
        form.filename.as_deref().unwrap_or("<unnamed>"),
        bytes.len()
    );

    let raw = tokio::task::spawn_blocking(move || extract(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))??;

    let requirements = normalize(raw, &form.overrides);

    Ok(Json(ExtractResponse {
        filename: form.filename,
        requirements,
    }))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_lowercase();
        match name.as_str() {
            "file" => {
                form.filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                form.bytes = Some(data.to_vec());
            }
            other => {
                let Some(level) = heading_field(other) else {
                    continue;
                };
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read field '{other}': {e}")))?;
                let count = parse_override(&text).ok_or_else(|| {
                    AppError::Validation(format!("'{other}' must be a non-negative integer"))
                })?;
                form.overrides.set(level, count);
            }
        }
    }

    Ok(form)
}

fn heading_field(name: &str) -> Option<HeadingLevel> {
    HeadingLevel::QUOTA_LEVELS
        .into_iter()
        .find(|level| level.to_string().eq_ignore_ascii_case(name))
}

/// Blank means "no override".
fn parse_override(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0);
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_field_names() {
        assert_eq!(heading_field("h2"), Some(HeadingLevel::H2));
        assert_eq!(heading_field("h6"), Some(HeadingLevel::H6));
        assert_eq!(heading_field("h1"), None);
        assert_eq!(heading_field("file"), None);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override(" 4 "), Some(4));
        assert_eq!(parse_override(""), Some(0));
        assert_eq!(parse_override("-1"), None);
        assert_eq!(parse_override("four"), None);
    }
}
