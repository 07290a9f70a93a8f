//! Generation Orchestrator: drives the completion service end to end.
//!
//! Single-pass: article prompt → completion → parse.
//! Two-phase: outline prompt → completion → parse_outline → body prompt →
//! completion → parse. Either flow may finish with an HTML rendering call.
//! Token usage is summed over every call made.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generation::prompt_builder::{
    build_body_prompt, build_html_prompt, build_outline_prompt, build_prompt, Prompt, PromptOptions,
};
use crate::generation::response_parser::{
    extract_html, parse_outline, parse_response, GenerationResult,
};
use crate::llm_client::{CompletionRequest, CompletionService, LlmError, TokenUsage};
use crate::requirements::Requirements;

/// Model and token limits for completion calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub max_output_tokens: u32,
    pub validation_max_tokens: u32,
    /// Default LSI limit when the caller gives none.
    pub lsi_limit: usize,
}

impl GenerationConfig {
    pub fn request(&self, prompt: Prompt, max_output_tokens: u32) -> CompletionRequest {
        CompletionRequest {
            system_instructions: prompt.system,
            user_prompt: prompt.user,
            max_output_tokens,
            model_id: self.model_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub two_phase: bool,
    pub render_html: bool,
}

pub async fn generate(
    service: &dyn CompletionService,
    config: &GenerationConfig,
    requirements: &Requirements,
    prompt_options: &PromptOptions,
    options: GenerateOptions,
) -> Result<GenerationResult, LlmError> {
    info!(
        "Generating content for '{}' (model={}, two_phase={}, render_html={})",
        requirements.primary_keyword, config.model_id, options.two_phase, options.render_html
    );

    let mut usage = TokenUsage::default();

    let mut result = if options.two_phase {
        let outline_prompt = build_outline_prompt(requirements, prompt_options);
        let response = service
            .complete(&config.request(outline_prompt, config.max_output_tokens))
            .await?;
        usage += response.token_usage;

        let outline = parse_outline(&response.text);
        info!(
            "Outline accepted: '{}' with {} headings",
            outline.meta_title,
            outline.headings.len()
        );

        let body_prompt = build_body_prompt(requirements, &outline, prompt_options);
        let response = service
            .complete(&config.request(body_prompt, config.max_output_tokens))
            .await?;
        usage += response.token_usage;

        let mut result = parse_response(&response.text);
        if result.meta_title.is_empty() {
            result.meta_title = outline.meta_title;
        }
        if result.meta_description.is_empty() {
            result.meta_description = outline.meta_description;
        }
        result
    } else {
        let prompt = build_prompt(requirements, prompt_options);
        let response = service
            .complete(&config.request(prompt, config.max_output_tokens))
            .await?;
        usage += response.token_usage;
        parse_response(&response.text)
    };

    if options.render_html {
        let (html, html_usage) = render_html(service, config, &result.body_markdown).await?;
        usage += html_usage;
        result.html = Some(html);
    }

    result.token_usage = usage;
    info!(
        "Generation {} finished: {} headings, tokens in={} out={}",
        result.id,
        result.heading_outline.len(),
        usage.input,
        usage.output
    );

    Ok(result)
}

/// Converts markdown to HTML through the completion service.
pub async fn render_html(
    service: &dyn CompletionService,
    config: &GenerationConfig,
    markdown: &str,
) -> Result<(String, TokenUsage), LlmError> {
    let response = service
        .complete(&config.request(build_html_prompt(markdown), config.max_output_tokens))
        .await?;
    Ok((extract_html(&response.text), response.token_usage))
}
