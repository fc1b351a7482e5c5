use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::Notifier;
use crate::config::AppConfig;
use crate::{Error, Result};

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    client: Client,
    api_base_url: String,
    bot_token: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        client: Client,
        api_base_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            bot_token: bot_token.into(),
        }
    }

    /// Build a notifier from the `[telegram]` section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let bot_token = config
            .telegram
            .bot_token
            .as_ref()
            .ok_or_else(|| Error::Config("Telegram bot token not configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.sync.request_timeout_secs))
            .build()?;

        Ok(Self::new(client, config.telegram.api_base_url.clone(), bot_token.clone()))
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": destination,
                "text": message,
                "parse_mode": "HTML"
            }))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        check_response(status, &body)
    }
}

/// Classify a Bot API reply; only a 2xx status with `"ok": true` counts as sent
fn check_response(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(api) if status.is_success() && api.ok => Ok(()),
        Ok(api) => Err(Error::Delivery(format!(
            "Telegram API error ({}): {}",
            status,
            api.description.unwrap_or_default()
        ))),
        Err(_) => Err(Error::Delivery(format!("Telegram API error ({}): {}", status, body))),
    }
}
