mod message;
mod telegram;

pub use message::format_message;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::Result;

/// Downstream channel that receives formatted article messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<()>;
}
