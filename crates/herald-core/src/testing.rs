//! In-memory doubles shared by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::mpsc;

use crate::ai::providers::AiProvider;
use crate::feed::{Article, FeedSource, FeedSourceFactory, Item, NewArticle, Source};
use crate::notify::Notifier;
use crate::scheduler::Ticker;
use crate::storage::{ArticleStore, SourceRegistry};
use crate::{Error, Result};

/// Ticker driven by hand through the returned sender
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ManualTicker {
    pub fn new() -> (Self, mpsc::UnboundedSender<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn item(title: &str, link: &str, categories: &[&str]) -> Item {
    Item {
        title: title.to_string(),
        link: link.to_string(),
        summary: format!("About {}", title),
        published_at: Utc::now().fixed_offset(),
        categories: categories.iter().map(|c| c.to_string()).collect::<HashSet<_>>(),
    }
}

pub fn item_at(title: &str, link: &str, published_at: DateTime<FixedOffset>) -> Item {
    Item {
        published_at,
        ..item(title, link, &[])
    }
}

pub struct StaticRegistry {
    sources: Vec<Source>,
}

impl StaticRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    pub fn source(id: i64, name: &str) -> Source {
        Source {
            id,
            name: name.to_string(),
            feed_url: format!("https://{}.example/feed/{}", name, id),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SourceRegistry for StaticRegistry {
    async fn list(&self) -> Result<Vec<Source>> {
        Ok(self.sources.clone())
    }
}

pub struct FailingRegistry;

#[async_trait]
impl SourceRegistry for FailingRegistry {
    async fn list(&self) -> Result<Vec<Source>> {
        Err(Error::Database(sqlx::Error::PoolClosed))
    }
}

#[derive(Default)]
struct FetchCounters {
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Factory serving canned items (or a canned error) per source id
#[derive(Default)]
pub struct StaticFactory {
    responses: HashMap<i64, std::result::Result<Vec<Item>, String>>,
    delay: Option<Duration>,
    counters: Arc<FetchCounters>,
}

impl StaticFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, source_id: i64, items: Vec<Item>) -> Self {
        self.responses.insert(source_id, Ok(items));
        self
    }

    pub fn with_error(mut self, source_id: i64, message: &str) -> Self {
        self.responses.insert(source_id, Err(message.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.counters.fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

impl FeedSourceFactory for StaticFactory {
    fn build(&self, source: &Source) -> Box<dyn FeedSource> {
        Box::new(StaticSource {
            id: source.id,
            name: source.name.clone(),
            response: self.responses.get(&source.id).cloned().unwrap_or_else(|| Ok(Vec::new())),
            delay: self.delay,
            counters: Arc::clone(&self.counters),
        })
    }
}

struct StaticSource {
    id: i64,
    name: String,
    response: std::result::Result<Vec<Item>, String>,
    delay: Option<Duration>,
    counters: Arc<FetchCounters>,
}

#[async_trait]
impl FeedSource for StaticSource {
    fn identify(&self) -> (i64, &str) {
        (self.id, self.name.as_str())
    }

    async fn fetch(&self) -> Result<Vec<Item>> {
        self.counters.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.response.clone().map_err(Error::FeedParse)
    }
}

/// Article store backed by a vector, with switchable failures
#[derive(Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<Article>>,
    fail_store_link: Option<String>,
    fail_mark: AtomicBool,
    fail_queries: AtomicBool,
    pending_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_store_on(mut self, link: &str) -> Self {
        self.fail_store_link = Some(link.to_string());
        self
    }

    pub fn fail_mark_delivered(&self) {
        self.fail_mark.store(true, Ordering::SeqCst);
    }

    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub fn pending_calls(&self) -> usize {
        self.pending_calls.load(Ordering::SeqCst)
    }

    pub fn links(&self) -> Vec<String> {
        self.articles.lock().unwrap().iter().map(|a| a.link.clone()).collect()
    }

    pub fn delivered_at(&self, link: &str) -> Option<DateTime<Utc>> {
        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.link == link)
            .and_then(|a| a.delivered_at)
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn store(&self, article: &NewArticle) -> Result<bool> {
        if self.fail_store_link.as_deref() == Some(article.link.as_str()) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }

        let mut articles = self.articles.lock().unwrap();
        if articles.iter().any(|a| a.link == article.link) {
            return Ok(false);
        }

        let id = articles.len() as i64 + 1;
        articles.push(Article {
            id,
            source_id: article.source_id,
            title: article.title.clone(),
            link: article.link.clone(),
            summary: article.summary.clone(),
            published_at: article.published_at,
            delivered_at: None,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn pending_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }

        let mut pending: Vec<Article> = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.delivered_at.is_none() && a.published_at >= cutoff)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_delivered(&self, id: i64) -> Result<bool> {
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }

        let mut articles = self.articles.lock().unwrap();
        match articles.iter_mut().find(|a| a.id == id) {
            Some(article) if article.delivered_at.is_none() => {
                article.delivered_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Notifier that records every message instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail_on: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any message containing `needle`
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        if let Some(needle) = &self.fail_on {
            if message.contains(needle.as_str()) {
                return Err(Error::Delivery("rejected".to_string()));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

/// Provider that prefixes its input and fails on chosen text
#[derive(Default)]
pub struct ScriptedProvider {
    fail_on: Option<String>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(Error::AiProvider("model unavailable".to_string()));
            }
        }
        Ok(format!("summary of: {}", text))
    }
}

/// Provider whose summaries never complete
pub struct HangingProvider;

#[async_trait]
impl AiProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn summarize(&self, _text: &str) -> Result<String> {
        std::future::pending().await
    }
}
