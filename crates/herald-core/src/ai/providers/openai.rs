use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};

use super::{truncate_chars, AiProvider};
use crate::{Error, Result};

/// Upper bound for a single completion request
const AI_REQUEST_TIMEOUT_SECS: u64 = 60;

/// OpenAI chat-completion provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    prompt: String,
    max_tokens: u32,
    max_input_chars: usize,
}

impl OpenAiProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        max_input_chars: usize,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(AI_REQUEST_TIMEOUT_SECS))
            .build()?;
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config).with_http_client(http_client);

        Ok(Self {
            client,
            model: model.to_string(),
            prompt: prompt.to_string(),
            max_tokens,
            max_input_chars,
        })
    }

    async fn chat(&self, text: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompt.as_str())
                .build()
                .map_err(|e| Error::AiProvider(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|e| Error::AiProvider(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::AiProvider("empty completion".to_string()))
    }
}

#[async_trait::async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let truncated = truncate_chars(text, self.max_input_chars);
        self.chat(truncated).await
    }
}
