use super::{truncate_chars, AiProvider};
use crate::Result;

/// Relays the feed's own summary, trimmed to a length that fits one message
pub struct PassthroughProvider {
    max_chars: usize,
}

impl PassthroughProvider {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait::async_trait]
impl AiProvider for PassthroughProvider {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let text = text.trim();
        let truncated = truncate_chars(text, self.max_chars);
        if truncated.len() < text.len() {
            Ok(format!("{}...", truncated.trim_end()))
        } else {
            Ok(truncated.to_string())
        }
    }
}
