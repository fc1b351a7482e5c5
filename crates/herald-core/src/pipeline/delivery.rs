use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, info, warn};

use crate::ai::Summarizer;
use crate::config::AppConfig;
use crate::feed::Article;
use crate::notify::{format_message, Notifier};
use crate::scheduler::{is_shutdown, wait_for_shutdown, PeriodicTask, ShutdownSignal};
use crate::storage::ArticleStore;
use crate::{Error, Result};

/// Where and how much the delivery loop sends
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    /// Channel identifier passed to the notifier
    pub destination: String,
    /// Articles published longer ago than this are never delivered
    pub stale_window: Duration,
    /// Maximum articles per cycle
    pub batch_size: u32,
}

impl DeliverySettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let destination = config
            .telegram
            .channel_id
            .clone()
            .ok_or_else(|| Error::Config("Telegram channel_id not configured".to_string()))?;

        Ok(Self {
            destination,
            stale_window: config.sync.stale_window()?,
            batch_size: config.sync.delivery_batch_size,
        })
    }
}

/// Counters for one delivery cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub selected: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pending, {} delivered, {} failed",
            self.selected, self.delivered, self.failed
        )
    }
}

/// Summarizes and sends the freshest pending articles, newest first
pub struct DeliveryPipeline {
    articles: Arc<dyn ArticleStore>,
    summarizer: Arc<Summarizer>,
    notifier: Arc<dyn Notifier>,
    settings: DeliverySettings,
}

impl DeliveryPipeline {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        summarizer: Arc<Summarizer>,
        notifier: Arc<dyn Notifier>,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            articles,
            summarizer,
            notifier,
            settings,
        }
    }

    /// Oldest publication time still eligible for delivery at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        delivery_cutoff(now, self.settings.stale_window)
    }

    /// Run one delivery cycle
    pub async fn run_cycle(&self, shutdown: &ShutdownSignal) -> Result<DeliveryReport> {
        self.run_cycle_at(Utc::now(), shutdown).await
    }

    /// Run one delivery cycle as of `now`.
    ///
    /// Articles go out strictly one at a time in the order returned by the store.
    /// A summarize or send failure skips that article (it stays pending for the next
    /// cycle); a store failure while marking delivered aborts the rest of the batch.
    /// Shutdown is honored between articles and while summarizing, never once a
    /// send has started.
    pub async fn run_cycle_at(
        &self,
        now: DateTime<Utc>,
        shutdown: &ShutdownSignal,
    ) -> Result<DeliveryReport> {
        if is_shutdown(shutdown) {
            return Err(Error::Cancelled);
        }

        let cutoff = self.cutoff(now)?;
        let articles = self.articles.pending_since(cutoff, self.settings.batch_size).await?;

        let mut report = DeliveryReport {
            selected: articles.len(),
            ..Default::default()
        };

        for article in &articles {
            if is_shutdown(shutdown) {
                info!("Delivery cycle cancelled: {}", report);
                return Err(Error::Cancelled);
            }

            match self.deliver(article, shutdown).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    info!("Delivery cycle cancelled while summarizing: {}", report);
                    return Err(Error::Cancelled);
                }
                Err(e) => {
                    warn!("Failed to deliver article {} '{}': {}", article.id, article.title, e);
                    report.failed += 1;
                    continue;
                }
            }

            match self.articles.mark_delivered(article.id).await {
                Ok(true) => {}
                Ok(false) => debug!("Article {} was already marked delivered", article.id),
                Err(e) => {
                    error!("Failed to mark article {} delivered: {}", article.id, e);
                    return Err(e);
                }
            }
            report.delivered += 1;
        }

        Ok(report)
    }

    async fn deliver(&self, article: &Article, shutdown: &ShutdownSignal) -> Result<()> {
        // Nothing has been sent yet, so the summary can be abandoned on shutdown.
        let mut shutdown = shutdown.clone();
        let summary = tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown) => return Err(Error::Cancelled),
            summary = self.summarizer.summarize(article.summary_source()) => summary?,
        };
        let message = format_message(article, &summary);
        self.notifier.send(&self.settings.destination, &message).await?;

        debug!("Delivered article {}: {}", article.id, article.link);
        Ok(())
    }
}

/// Oldest publication time still eligible for delivery at `now`, given the staleness window
pub fn delivery_cutoff(now: DateTime<Utc>, stale_window: Duration) -> Result<DateTime<Utc>> {
    let window = TimeDelta::from_std(stale_window)
        .map_err(|e| Error::Config(format!("Invalid staleness window: {}", e)))?;

    now.checked_sub_signed(window)
        .ok_or_else(|| Error::Config("Staleness window is too large".to_string()))
}

#[async_trait]
impl PeriodicTask for DeliveryPipeline {
    type Report = DeliveryReport;

    fn name(&self) -> &'static str {
        "delivery"
    }

    async fn run_once(&self, shutdown: &ShutdownSignal) -> Result<DeliveryReport> {
        self.run_cycle(shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::NewArticle;
    use crate::scheduler::shutdown_channel;
    use crate::testing::{HangingProvider, MemoryStore, RecordingNotifier, ScriptedProvider};
    use chrono::TimeZone;

    const CHANNEL: &str = "@news";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn settings() -> DeliverySettings {
        DeliverySettings {
            destination: CHANNEL.to_string(),
            // fetch interval 5m, stale multiplier 2
            stale_window: Duration::from_secs(300) * 2,
            batch_size: 10,
        }
    }

    async fn seed(store: &MemoryStore, link: &str, minutes_ago: i64) {
        store
            .store(&NewArticle {
                source_id: 1,
                title: format!("Title {}", link),
                link: link.to_string(),
                summary: format!("Summary {}", link),
                published_at: now() - TimeDelta::minutes(minutes_ago),
            })
            .await
            .unwrap();
    }

    fn pipeline(
        store: Arc<MemoryStore>,
        provider: ScriptedProvider,
        notifier: Arc<RecordingNotifier>,
    ) -> DeliveryPipeline {
        DeliveryPipeline::new(
            store,
            Arc::new(Summarizer::with_provider(Arc::new(provider))),
            notifier,
            settings(),
        )
    }

    #[test]
    fn test_cutoff_is_now_minus_stale_window() {
        let pipeline = pipeline(
            Arc::new(MemoryStore::new()),
            ScriptedProvider::new(),
            Arc::new(RecordingNotifier::new()),
        );

        assert_eq!(pipeline.cutoff(now()).unwrap(), now() - TimeDelta::minutes(10));
    }

    #[tokio::test]
    async fn test_delivers_newest_first_and_skips_stale() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "old", 11).await;
        seed(&store, "mid", 7).await;
        seed(&store, "new", 2).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let (_tx, rx) = shutdown_channel();

        let report = pipeline(store.clone(), ScriptedProvider::new(), notifier.clone())
            .run_cycle_at(now(), &rx)
            .await
            .unwrap();

        assert_eq!(report, DeliveryReport { selected: 2, delivered: 2, failed: 0 });

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(dest, _)| dest == CHANNEL));
        assert!(sent[0].1.contains("Title new"));
        assert!(sent[1].1.contains("Title mid"));
        assert!(sent[0].1.contains("summary of: Summary new"));

        assert!(store.delivered_at("new").is_some());
        assert!(store.delivered_at("mid").is_some());
        assert!(store.delivered_at("old").is_none());
    }

    #[tokio::test]
    async fn test_second_cycle_sends_nothing_new() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", 1).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let pipeline = pipeline(store.clone(), ScriptedProvider::new(), notifier.clone());
        let (_tx, rx) = shutdown_channel();

        pipeline.run_cycle_at(now(), &rx).await.unwrap();
        let first_mark = store.delivered_at("a");
        let report = pipeline.run_cycle_at(now(), &rx).await.unwrap();

        assert_eq!(report.selected, 0);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(store.delivered_at("a"), first_mark);
    }

    #[tokio::test]
    async fn test_summarize_failure_skips_only_that_article() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "first", 1).await;
        seed(&store, "broken", 2).await;
        seed(&store, "third", 3).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = ScriptedProvider::new().fail_on("Summary broken");
        let (_tx, rx) = shutdown_channel();

        let report = pipeline(store.clone(), provider, notifier.clone())
            .run_cycle_at(now(), &rx)
            .await
            .unwrap();

        assert_eq!(report, DeliveryReport { selected: 3, delivered: 2, failed: 1 });
        assert!(store.delivered_at("first").is_some());
        assert!(store.delivered_at("broken").is_none());
        assert!(store.delivered_at("third").is_some());
    }

    #[tokio::test]
    async fn test_send_failure_leaves_article_pending() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "first", 1).await;
        seed(&store, "second", 2).await;
        let notifier = Arc::new(RecordingNotifier::new().fail_on("Title first"));
        let (_tx, rx) = shutdown_channel();

        let report = pipeline(store.clone(), ScriptedProvider::new(), notifier.clone())
            .run_cycle_at(now(), &rx)
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert!(store.delivered_at("first").is_none());
        assert!(store.delivered_at("second").is_some());
    }

    #[tokio::test]
    async fn test_mark_failure_aborts_batch() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "first", 1).await;
        seed(&store, "second", 2).await;
        store.fail_mark_delivered();
        let notifier = Arc::new(RecordingNotifier::new());
        let (_tx, rx) = shutdown_channel();

        let result = pipeline(store.clone(), ScriptedProvider::new(), notifier.clone())
            .run_cycle_at(now(), &rx)
            .await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_store_failure_fails_cycle() {
        let store = Arc::new(MemoryStore::new());
        store.fail_queries();
        let notifier = Arc::new(RecordingNotifier::new());
        let (_tx, rx) = shutdown_channel();

        let result = pipeline(store, ScriptedProvider::new(), notifier.clone())
            .run_cycle_at(now(), &rx)
            .await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_cycle_sends_nothing() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", 1).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let (tx, rx) = shutdown_channel();
        tx.send(true).unwrap();

        let result = pipeline(store.clone(), ScriptedProvider::new(), notifier.clone())
            .run_cycle_at(now(), &rx)
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(notifier.sent().is_empty());
        assert_eq!(store.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_settings_require_channel() {
        let config = AppConfig::default();
        assert!(matches!(DeliverySettings::from_config(&config), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.telegram.channel_id = Some(CHANNEL.to_string());
        let settings = DeliverySettings::from_config(&config).unwrap();
        assert_eq!(settings.stale_window, Duration::from_secs(600));
        assert_eq!(settings.batch_size, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_stalled_summary() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", 1).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let pipeline = DeliveryPipeline::new(
            store.clone(),
            Arc::new(Summarizer::with_provider(Arc::new(HangingProvider))),
            notifier.clone(),
            settings(),
        );
        let (tx, rx) = shutdown_channel();

        let handle = tokio::spawn(async move { pipeline.run_cycle_at(now(), &rx).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(60), handle)
            .await
            .expect("delivery should stop after shutdown")
            .unwrap();

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(notifier.sent().is_empty());
        assert!(store.delivered_at("a").is_none());
    }

    #[test]
    fn test_cutoff_rejects_out_of_range_window() {
        let result = delivery_cutoff(now(), Duration::from_secs(u64::MAX));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_settings_reject_overflowing_window() {
        let mut config = AppConfig::default();
        config.telegram.channel_id = Some(CHANNEL.to_string());
        config.sync.fetch_interval_secs = u64::MAX / 2;
        config.sync.stale_multiplier = 3;

        assert!(matches!(DeliverySettings::from_config(&config), Err(Error::Config(_))));
    }
}
