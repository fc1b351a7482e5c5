use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy};
use url::Url;

use super::models::{Item, Source};
use super::parser::parse_items;
use super::source::{FeedSource, FeedSourceFactory};
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const HERALD_USER_AGENT: &str = concat!("herald/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by every feed adapter
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(config.sync.request_timeout_secs, &config.sync.proxy_url)?;
        Ok(Self { client })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .default_headers(Self::default_headers())
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5",
            ),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(HERALD_USER_AGENT));
        headers
    }

    /// Fetch a feed and parse its entries
    pub async fn fetch_items(&self, url: &str) -> Result<Vec<Item>> {
        let content = self.fetch_raw(url).await?;
        parse_items(&content, Utc::now())
    }

    /// Fetch feed content as raw bytes
    pub async fn fetch_raw(&self, url: &str) -> Result<Bytes> {
        let url = Url::parse(url)?;

        tracing::debug!("Fetching feed from: {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        if let Some(length) = response.content_length() {
            ensure_content_size(length as usize, url.as_str())?;
        }

        let bytes = response.bytes().await?;
        ensure_content_size(bytes.len(), url.as_str())?;

        Ok(bytes)
    }
}

fn ensure_content_size(size: usize, url: &str) -> Result<()> {
    if size > MAX_FEED_BYTES {
        return Err(Error::FeedParse(format!(
            "Feed too large ({} bytes) for URL: {}",
            size, url
        )));
    }
    Ok(())
}

/// RSS/Atom adapter for one configured source
pub struct RssFeedSource {
    id: i64,
    name: String,
    feed_url: String,
    fetcher: Arc<FeedFetcher>,
}

impl RssFeedSource {
    pub fn new(source: &Source, fetcher: Arc<FeedFetcher>) -> Self {
        Self {
            id: source.id,
            name: source.name.clone(),
            feed_url: source.feed_url.clone(),
            fetcher,
        }
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn identify(&self) -> (i64, &str) {
        (self.id, self.name.as_str())
    }

    async fn fetch(&self) -> Result<Vec<Item>> {
        self.fetcher.fetch_items(&self.feed_url).await
    }
}

/// Builds [`RssFeedSource`] adapters sharing one HTTP client
pub struct HttpFeedFactory {
    fetcher: Arc<FeedFetcher>,
}

impl HttpFeedFactory {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Arc::new(FeedFetcher::new(config)?),
        })
    }
}

impl FeedSourceFactory for HttpFeedFactory {
    fn build(&self, source: &Source) -> Box<dyn FeedSource> {
        Box::new(RssFeedSource::new(source, Arc::clone(&self.fetcher)))
    }
}
