use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::feed::{Article, NewArticle, Source};
use crate::Result;

/// Read-only view of the configured sources
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<Source>>;
}

/// Durable article persistence shared by the ingestion and delivery loops.
///
/// The loops never coordinate with each other, so implementations must provide
/// both guarantees at the storage layer:
/// - `store` is an atomic insert-or-ignore keyed by link (first write wins).
/// - `mark_delivered` is an atomic set-once on the delivered timestamp.
///
/// Errors are returned to the caller and never retried here.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert an article. Returns `false` when the link already exists.
    async fn store(&self, article: &NewArticle) -> Result<bool>;

    /// Undelivered articles published at or after `cutoff`, newest first, at most `limit`.
    async fn pending_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<Article>>;

    /// Stamp the article delivered now. Returns `false` if it was already delivered
    /// (the first timestamp is kept) or does not exist.
    async fn mark_delivered(&self, id: i64) -> Result<bool>;
}
