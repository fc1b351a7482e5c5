use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

const ENV_TELEGRAM_BOT_TOKEN: &str = "HERALD_TELEGRAM_BOT_TOKEN";
const ENV_TELEGRAM_CHANNEL_ID: &str = "HERALD_TELEGRAM_CHANNEL_ID";
const ENV_OPENAI_API_KEY: &str = "HERALD_OPENAI_API_KEY";
const ENV_DATABASE_URL: &str = "HERALD_DATABASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Full database URL, overrides the file inside `data_dir`
    #[serde(default)]
    pub database_url: Option<String>,
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_url: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between ingestion cycles
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Seconds between delivery cycles
    #[serde(default = "default_delivery_interval")]
    pub delivery_interval_secs: u64,
    /// Staleness window, in multiples of the fetch interval
    #[serde(default = "default_stale_multiplier")]
    pub stale_multiplier: u32,
    /// Maximum articles delivered per cycle
    #[serde(default = "default_delivery_batch_size")]
    pub delivery_batch_size: u32,
    /// Maximum sources fetched concurrently within one cycle
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval(),
            delivery_interval_secs: default_delivery_interval(),
            stale_multiplier: default_stale_multiplier(),
            delivery_batch_size: default_delivery_batch_size(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

impl SyncConfig {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn delivery_interval(&self) -> Duration {
        Duration::from_secs(self.delivery_interval_secs)
    }

    /// Maximum age of an undelivered article still eligible for delivery
    pub fn stale_window(&self) -> Result<Duration> {
        self.fetch_interval()
            .checked_mul(self.stale_multiplier)
            .ok_or_else(|| {
                Error::Config(
                    "sync.fetch_interval_secs * sync.stale_multiplier is too large".to_string(),
                )
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Items whose title or categories match any of these are never stored
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Use the configured AI provider; when false, feed summaries are relayed as-is
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// AI provider: "openai" or "passthrough"
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    /// OpenAI API key (for openai provider)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Instruction prepended to the article text
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Max tokens for summary
    #[serde(default = "default_max_tokens")]
    pub max_summary_tokens: u32,
    /// Article text beyond this many characters is not sent to the provider
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            provider: default_ai_provider(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            prompt: default_prompt(),
            max_summary_tokens: default_max_tokens(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Destination channel, e.g. "@my_channel" or "-1001234567890"
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Bot API base URL
    #[serde(default = "default_telegram_api_base_url")]
    pub api_base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_base_url: default_telegram_api_base_url(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("herald")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_fetch_interval() -> u64 {
    300 // 5 minutes
}

fn default_delivery_interval() -> u64 {
    60
}

fn default_stale_multiplier() -> u32 {
    2
}

fn default_delivery_batch_size() -> u32 {
    10
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_timeout() -> u64 {
    30
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_prompt() -> String {
    "Summarize the following article in 2-3 sentences. Be concise and focus on the key points."
        .to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_max_input_chars() -> usize {
    4000
}

fn default_telegram_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Override secrets and connection settings from the environment
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_TELEGRAM_BOT_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(channel) = lookup(ENV_TELEGRAM_CHANNEL_ID) {
            self.telegram.channel_id = Some(channel);
        }
        if let Some(key) = lookup(ENV_OPENAI_API_KEY) {
            self.ai.openai_api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.general.database_url = Some(url);
        }
    }

    /// Reject settings the loops cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sync.fetch_interval_secs == 0 {
            return Err(Error::Config("sync.fetch_interval_secs must be positive".to_string()));
        }
        if self.sync.delivery_interval_secs == 0 {
            return Err(Error::Config("sync.delivery_interval_secs must be positive".to_string()));
        }
        if self.sync.stale_multiplier == 0 {
            return Err(Error::Config("sync.stale_multiplier must be positive".to_string()));
        }
        if self.sync.delivery_batch_size == 0 {
            return Err(Error::Config("sync.delivery_batch_size must be positive".to_string()));
        }
        if self.sync.max_concurrent_fetches == 0 {
            return Err(Error::Config("sync.max_concurrent_fetches must be positive".to_string()));
        }
        self.sync.stale_window()?;
        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/herald/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("herald")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("herald.db")
    }

    /// Connection URL for the article store
    pub fn database_url(&self) -> String {
        match self.general.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }
}
