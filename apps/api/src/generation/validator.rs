//! Optional LLM validation pass over generated content.
//!
//! Complements the deterministic analyzer with a model judgement on the
//! top LSI keywords, the leading entities and the heading hierarchy.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generation::prompt_builder::{fill_template, Prompt};
use crate::generation::prompts::{VALIDATION_PROMPT_TEMPLATE, VALIDATION_SYSTEM};
use crate::generation::GenerationConfig;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{complete_json, CompletionService, LlmError, TokenUsage};
use crate::requirements::{HeadingLevel, Requirements};

/// Keywords and entities sent to the validator.
const VALIDATION_SAMPLE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub keyword: String,
    pub required: u32,
    pub found: u32,
    pub fix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmValidation {
    pub passes_validation: bool,
    pub issues: Vec<LlmIssue>,
    pub summary: String,
    #[serde(skip_deserializing)]
    pub token_usage: TokenUsage,
}

pub fn build_validation_prompt(content: &str, requirements: &Requirements) -> Prompt {
    let lsi = requirements
        .lsi_keywords
        .top(VALIDATION_SAMPLE)
        .into_iter()
        .map(|(keyword, target)| format!("{keyword} ({target})"))
        .collect::<Vec<_>>()
        .join(", ");

    let entities = requirements
        .entities
        .iter()
        .take(VALIDATION_SAMPLE)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let headings = HeadingLevel::QUOTA_LEVELS
        .into_iter()
        .filter_map(|level| {
            let count = requirements.heading_structure.get(level);
            (count > 0).then(|| format!("{level}: {count}"))
        })
        .collect::<Vec<_>>()
        .join(", ");

    let or_none = |s: String| if s.is_empty() { "None".to_string() } else { s };

    let user = fill_template(
        VALIDATION_PROMPT_TEMPLATE,
        &[
            ("content", content),
            ("lsi", or_none(lsi).as_str()),
            ("entities", or_none(entities).as_str()),
            ("headings", or_none(headings).as_str()),
        ],
    );

    Prompt {
        system: format!("{VALIDATION_SYSTEM} {JSON_ONLY_INSTRUCTION}"),
        user,
    }
}

pub async fn validate_with_llm(
    service: &dyn CompletionService,
    config: &GenerationConfig,
    content: &str,
    requirements: &Requirements,
) -> Result<LlmValidation, LlmError> {
    let prompt = build_validation_prompt(content, requirements);
    let request = config.request(prompt, config.validation_max_tokens);

    let (mut validation, usage): (LlmValidation, TokenUsage) =
        complete_json(service, &request).await?;
    validation.token_usage = usage;

    info!(
        "LLM validation for '{}': passes={}, {} issues",
        requirements.primary_keyword,
        validation.passes_validation,
        validation.issues.len()
    );
    Ok(validation)
}
