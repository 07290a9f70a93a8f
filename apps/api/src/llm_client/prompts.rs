// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to system prompts whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to prompts whose reply is a single fenced document.
pub const FENCED_OUTPUT_INSTRUCTION: &str = "Return the complete document inside a single \
    fenced code block and nothing else: no introduction, no closing remarks.";
