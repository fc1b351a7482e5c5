use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::filter::KeywordFilter;
use crate::feed::{FeedSource, FeedSourceFactory, NewArticle};
use crate::scheduler::{is_shutdown, wait_for_shutdown, PeriodicTask, ShutdownSignal};
use crate::storage::{ArticleStore, SourceRegistry};
use crate::{Error, Result};

const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Counters for one ingestion cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: usize,
    pub fetched: usize,
    pub filtered: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Sources whose fetch failed or whose storing stopped early
    pub failed_sources: usize,
}

impl IngestReport {
    fn absorb(&mut self, outcome: &SourceOutcome) {
        self.fetched += outcome.fetched;
        self.filtered += outcome.filtered;
        self.inserted += outcome.inserted;
        self.duplicates += outcome.duplicates;
        if outcome.failed {
            self.failed_sources += 1;
        }
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sources, {} items fetched, {} filtered, {} new, {} duplicates, {} failed sources",
            self.sources,
            self.fetched,
            self.filtered,
            self.inserted,
            self.duplicates,
            self.failed_sources
        )
    }
}

#[derive(Debug, Default)]
struct SourceOutcome {
    fetched: usize,
    filtered: usize,
    inserted: usize,
    duplicates: usize,
    failed: bool,
    cancelled: bool,
}

/// Fetches every source concurrently, filters items, and stores new articles
pub struct IngestPipeline {
    registry: Arc<dyn SourceRegistry>,
    factory: Arc<dyn FeedSourceFactory>,
    articles: Arc<dyn ArticleStore>,
    filter: Arc<KeywordFilter>,
    max_concurrency: usize,
}

impl IngestPipeline {
    pub fn new(
        registry: Arc<dyn SourceRegistry>,
        factory: Arc<dyn FeedSourceFactory>,
        articles: Arc<dyn ArticleStore>,
        filter: KeywordFilter,
    ) -> Self {
        Self {
            registry,
            factory,
            articles,
            filter: Arc::new(filter),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Cap the number of sources fetched at the same time
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Run one ingestion cycle.
    ///
    /// Fails only when the source list cannot be loaded. Per-source failures are
    /// logged and counted. Every spawned fetch is joined before this returns.
    pub async fn run_cycle(&self, shutdown: &ShutdownSignal) -> Result<IngestReport> {
        if is_shutdown(shutdown) {
            return Err(Error::Cancelled);
        }

        let sources = self.registry.list().await?;
        let mut report = IngestReport {
            sources: sources.len(),
            ..Default::default()
        };

        let mut join_set: JoinSet<SourceOutcome> = JoinSet::new();
        let mut pending = sources.iter().map(|source| self.factory.build(source));
        let mut cancelled = false;

        for _ in 0..self.max_concurrency {
            if let Some(adapter) = pending.next() {
                self.spawn_source(&mut join_set, adapter, shutdown.clone());
            }
        }

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(outcome) => {
                    cancelled |= outcome.cancelled;
                    report.absorb(&outcome);
                }
                Err(e) => {
                    error!("Source task failed to complete: {}", e);
                    report.failed_sources += 1;
                }
            }

            if cancelled || is_shutdown(shutdown) {
                cancelled = true;
                continue;
            }

            if let Some(adapter) = pending.next() {
                self.spawn_source(&mut join_set, adapter, shutdown.clone());
            }
        }

        if cancelled {
            info!("Ingestion cycle cancelled: {}", report);
            return Err(Error::Cancelled);
        }

        Ok(report)
    }

    fn spawn_source(
        &self,
        join_set: &mut JoinSet<SourceOutcome>,
        adapter: Box<dyn FeedSource>,
        mut shutdown: ShutdownSignal,
    ) {
        let articles = Arc::clone(&self.articles);
        let filter = Arc::clone(&self.filter);

        join_set.spawn(async move {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown) => SourceOutcome {
                    cancelled: true,
                    ..Default::default()
                },
                outcome = process_source(adapter.as_ref(), articles.as_ref(), &filter) => outcome,
            }
        });
    }
}

/// Fetch one source and store its items. A store error abandons the source's remaining items.
async fn process_source(
    adapter: &dyn FeedSource,
    articles: &dyn ArticleStore,
    filter: &KeywordFilter,
) -> SourceOutcome {
    let (source_id, name) = adapter.identify();

    let items = match adapter.fetch().await {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to fetch source '{}': {}", name, e);
            return SourceOutcome {
                failed: true,
                ..Default::default()
            };
        }
    };

    let mut outcome = SourceOutcome {
        fetched: items.len(),
        ..Default::default()
    };

    for item in items {
        if filter.should_skip(&item) {
            debug!("Filtered item '{}' from '{}'", item.title, name);
            outcome.filtered += 1;
            continue;
        }

        let article = NewArticle::from_item(source_id, item);
        match articles.store(&article).await {
            Ok(true) => outcome.inserted += 1,
            Ok(false) => outcome.duplicates += 1,
            Err(e) => {
                error!("Failed to store '{}' from '{}': {}", article.link, name, e);
                outcome.failed = true;
                break;
            }
        }
    }

    debug!(
        "Source '{}': {} fetched, {} new",
        name, outcome.fetched, outcome.inserted
    );

    outcome
}

#[async_trait]
impl PeriodicTask for IngestPipeline {
    type Report = IngestReport;

    fn name(&self) -> &'static str {
        "ingestion"
    }

    async fn run_once(&self, shutdown: &ShutdownSignal) -> Result<IngestReport> {
        self.run_cycle(shutdown).await
    }
}
