use std::sync::Arc;

use crate::config::Config;
use crate::generation::GenerationConfig;
use crate::llm_client::CompletionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model and token limits derived from `config` once at startup.
    pub generation: GenerationConfig,
    /// Pluggable completion backend. Production: `LlmClient`; tests use stubs.
    pub completion: Arc<dyn CompletionService>,
}
