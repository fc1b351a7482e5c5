use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A configured feed origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    pub created_at: DateTime<Utc>,
}

/// Data required to register a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub feed_url: String,
}

/// One entry parsed from a source at fetch time, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    /// Canonical identity of the item
    pub link: String,
    pub summary: String,
    /// Publication time with the offset the feed declared
    pub published_at: DateTime<FixedOffset>,
    pub categories: HashSet<String>,
}

/// Persisted, deduplicated representation of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    /// `None` while the article is pending delivery
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data required to store a new article
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

impl NewArticle {
    /// Build an article from a fetched item, normalizing its timestamp to UTC
    pub fn from_item(source_id: i64, item: Item) -> Self {
        Self {
            source_id,
            title: item.title,
            link: item.link,
            summary: item.summary,
            published_at: item.published_at.with_timezone(&Utc),
        }
    }
}

impl Article {
    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }

    /// Text handed to the summarizer: the feed summary, or the title when the feed gave none
    pub fn summary_source(&self) -> &str {
        let summary = self.summary.trim();
        if summary.is_empty() {
            &self.title
        } else {
            summary
        }
    }
}
