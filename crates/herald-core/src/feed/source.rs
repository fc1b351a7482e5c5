use async_trait::async_trait;

use super::models::{Item, Source};
use crate::Result;

/// Normalizes one external source into raw items. Stateless per call.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Stable id and display name of the underlying source
    fn identify(&self) -> (i64, &str);

    /// Fetch the source's current items
    async fn fetch(&self) -> Result<Vec<Item>>;
}

/// Builds an adapter for each configured source at the start of a cycle
pub trait FeedSourceFactory: Send + Sync {
    fn build(&self, source: &Source) -> Box<dyn FeedSource>;
}
