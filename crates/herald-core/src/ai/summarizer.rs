use std::sync::Arc;

use super::providers::{AiProvider, OpenAiProvider, PassthroughProvider};
use crate::config::AppConfig;
use crate::{Error, Result};

/// Summaries relayed without AI are capped to this many characters
const PASSTHROUGH_MAX_CHARS: usize = 600;

/// Summarizer that wraps the configured provider
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn AiProvider>,
}

impl Summarizer {
    /// Create a new summarizer based on configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        if !config.ai.enabled {
            return Ok(Self::with_provider(Arc::new(PassthroughProvider::new(
                PASSTHROUGH_MAX_CHARS,
            ))));
        }

        let provider: Arc<dyn AiProvider> = match config.ai.provider.as_str() {
            "openai" => {
                let api_key = config
                    .ai
                    .openai_api_key
                    .as_ref()
                    .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;
                Arc::new(OpenAiProvider::new(
                    api_key,
                    &config.ai.openai_model,
                    &config.ai.prompt,
                    config.ai.max_summary_tokens.max(1),
                    config.ai.max_input_chars.max(1),
                )?)
            }
            "passthrough" => Arc::new(PassthroughProvider::new(PASSTHROUGH_MAX_CHARS)),
            other => {
                return Err(Error::Config(format!("Unknown AI provider: {}", other)));
            }
        };

        Ok(Self::with_provider(provider))
    }

    /// Wrap an already-built provider
    pub fn with_provider(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate a summary for article text
    pub async fn summarize(&self, text: &str) -> Result<String> {
        self.provider.summarize(text).await
    }
}
