//! Axum route handlers for the Content API.

use std::path::PathBuf;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{analyze, AnalysisReport, ContentKind};
use crate::errors::AppError;
use crate::generation::orchestrator::{generate, GenerateOptions};
use crate::generation::prompt_builder::{build_prompt, Prompt, PromptOptions};
use crate::generation::response_parser::GenerationResult;
use crate::generation::validator::{validate_with_llm, LlmValidation};
use crate::output::write_bundle;
use crate::requirements::{apply_overrides, GenerationOverrides, Requirements};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub requirements: Requirements,
    #[serde(default)]
    pub overrides: GenerationOverrides,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub requirements: Requirements,
    pub prompt: Prompt,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub requirements: Requirements,
    #[serde(default)]
    pub overrides: GenerationOverrides,
    #[serde(default)]
    pub two_phase: bool,
    #[serde(default)]
    pub render_html: bool,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub result: GenerationResult,
    pub analysis: AnalysisReport,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub content: String,
    pub requirements: Requirements,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/content/prompt
///
/// Builds the single-pass prompt without calling the model.
/// Useful for previewing what generation will send.
pub async fn handle_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<PromptResponse>, AppError> {
    let (requirements, lsi_limit) = apply_overrides(
        request.requirements,
        &request.overrides,
        state.generation.lsi_limit,
    );
    let prompt = build_prompt(&requirements, &PromptOptions { lsi_limit });

    Ok(Json(PromptResponse {
        requirements,
        prompt,
    }))
}

/// POST /api/v1/content/generate
///
/// Full pipeline: overrides → prompt → completion(s) → parse → analyze,
/// optionally writing the output bundle.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let (requirements, lsi_limit) = apply_overrides(
        request.requirements,
        &request.overrides,
        state.generation.lsi_limit,
    );

    let options = GenerateOptions {
        two_phase: request.two_phase,
        render_html: request.render_html,
    };
    let result = generate(
        state.completion.as_ref(),
        &state.generation,
        &requirements,
        &PromptOptions { lsi_limit },
        options,
    )
    .await?;

    let analysis = analyze(&result.body_markdown, &requirements, ContentKind::Markdown);

    let output_dir = if request.save {
        let root = state.config.output_dir.clone();
        let (requirements, result, analysis) = (requirements.clone(), result.clone(), analysis.clone());
        let dir = tokio::task::spawn_blocking(move || {
            write_bundle(&root, &requirements, &result, &analysis)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in output: {e}")))??;
        Some(dir)
    } else {
        None
    };

    info!(
        "Generated '{}': passes_validation={}, saved={}",
        requirements.primary_keyword,
        analysis.passes_validation,
        output_dir.is_some()
    );

    Ok(Json(GenerateResponse {
        result,
        analysis,
        output_dir,
    }))
}

/// POST /api/v1/content/validate
///
/// LLM judgement of existing content. Complements /content/analyze.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<LlmValidation>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let validation = validate_with_llm(
        state.completion.as_ref(),
        &state.generation,
        &request.content,
        &request.requirements,
    )
    .await?;

    Ok(Json(validation))
}
