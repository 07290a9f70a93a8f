// Content generation: prompt construction, completion orchestration, response
// parsing and the optional LLM validation pass.
// All LLM calls go through llm_client::CompletionService.

pub mod handlers;
pub mod orchestrator;
pub mod prompt_builder;
pub mod prompts;
pub mod response_parser;
pub mod validator;

pub use orchestrator::GenerationConfig;
pub use response_parser::GenerationResult;
