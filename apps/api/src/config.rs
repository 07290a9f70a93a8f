use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::generation::GenerationConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub llm_model: String,
    pub llm_max_output_tokens: u32,
    pub llm_validation_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub output_dir: PathBuf,
    pub max_lsi_keywords: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| "claude-3-7-sonnet-latest".to_string()),
            llm_max_output_tokens: parse_env("LLM_MAX_OUTPUT_TOKENS", 15000)?,
            llm_validation_max_tokens: parse_env("LLM_VALIDATION_MAX_TOKENS", 1000)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 300)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 0)?,
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "output_markdown".to_string())
                .into(),
            max_lsi_keywords: parse_env("MAX_LSI_KEYWORDS", 40)?,
        })
    }

    /// Model and token limits handed to every generation call.
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.llm_model.clone(),
            max_output_tokens: self.llm_max_output_tokens,
            validation_max_tokens: self.llm_validation_max_tokens,
            lsi_limit: self.max_lsi_keywords,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: u32 = parse_env("CORA_API_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CORA_API_TEST_BAD_PORT", "eighty");
        let result: Result<u16> = parse_env("CORA_API_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        std::env::remove_var("CORA_API_TEST_BAD_PORT");
    }
}
