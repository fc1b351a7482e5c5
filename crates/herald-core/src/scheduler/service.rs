use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::runner::run_periodic;
use super::shutdown::ShutdownSignal;
use super::ticker::IntervalTicker;
use crate::ai::Summarizer;
use crate::config::AppConfig;
use crate::feed::HttpFeedFactory;
use crate::notify::TelegramNotifier;
use crate::pipeline::{DeliveryPipeline, DeliverySettings, IngestPipeline, KeywordFilter};
use crate::storage::{ArticleRepository, Database, SourceRepository};
use crate::Result;

/// Runs the ingestion and delivery loops side by side until shutdown
pub struct SchedulerService {
    ingest: Arc<IngestPipeline>,
    delivery: Arc<DeliveryPipeline>,
    fetch_interval: Duration,
    delivery_interval: Duration,
}

impl SchedulerService {
    pub fn new(
        ingest: Arc<IngestPipeline>,
        delivery: Arc<DeliveryPipeline>,
        fetch_interval: Duration,
        delivery_interval: Duration,
    ) -> Self {
        Self {
            ingest,
            delivery,
            fetch_interval,
            delivery_interval,
        }
    }

    /// Wire both pipelines against the database and the configured services
    pub fn from_config(db: &Database, config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(build_ingest_pipeline(db, config)?),
            Arc::new(build_delivery_pipeline(db, config)?),
            config.sync.fetch_interval(),
            config.sync.delivery_interval(),
        ))
    }

    /// Run both loops until the shutdown signal fires, then wait for both to stop
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        info!(
            "Scheduler started: fetch={}s, delivery={}s",
            self.fetch_interval.as_secs(),
            self.delivery_interval.as_secs()
        );

        let ingest = run_periodic(
            self.ingest.as_ref(),
            IntervalTicker::new(self.fetch_interval),
            shutdown.clone(),
        );
        let delivery = run_periodic(
            self.delivery.as_ref(),
            IntervalTicker::new(self.delivery_interval),
            shutdown,
        );

        let (ingest_result, delivery_result) = tokio::join!(ingest, delivery);
        for result in [ingest_result, delivery_result] {
            match result {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(e),
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }
}

/// Ingestion pipeline over the SQLite store and HTTP feeds
pub fn build_ingest_pipeline(db: &Database, config: &AppConfig) -> Result<IngestPipeline> {
    let pipeline = IngestPipeline::new(
        Arc::new(SourceRepository::new(db)),
        Arc::new(HttpFeedFactory::new(config)?),
        Arc::new(ArticleRepository::new(db)),
        KeywordFilter::new(config.filter.keywords.iter().cloned()),
    )
    .with_max_concurrency(config.sync.max_concurrent_fetches);

    Ok(pipeline)
}

/// Delivery pipeline over the SQLite store, the configured summarizer, and Telegram
pub fn build_delivery_pipeline(db: &Database, config: &AppConfig) -> Result<DeliveryPipeline> {
    Ok(DeliveryPipeline::new(
        Arc::new(ArticleRepository::new(db)),
        Arc::new(Summarizer::new(config)?),
        Arc::new(TelegramNotifier::from_config(config)?),
        DeliverySettings::from_config(config)?,
    ))
}
