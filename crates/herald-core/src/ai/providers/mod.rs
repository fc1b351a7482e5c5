mod openai;
mod passthrough;

pub use openai::OpenAiProvider;
pub use passthrough::PassthroughProvider;

use crate::Result;

/// Trait for summarization backends
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Generate a summary for the given text
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Cut `input` to at most `max_chars` characters, on a char boundary
pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
