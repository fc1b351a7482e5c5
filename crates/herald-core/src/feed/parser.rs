use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::Item;
use crate::{Error, Result};

/// Parse RSS/Atom feed content into items
///
/// Entries without a link are dropped, since the link is an item's identity.
/// When an entry carries no publication date, its updated date is used, then `fetched_at`.
pub fn parse_items(content: &[u8], fetched_at: DateTime<Utc>) -> Result<Vec<Item>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = match entry.links.first() {
                Some(link) => link.href.trim().to_string(),
                None => {
                    tracing::debug!("Skipping entry without link: {}", entry.id);
                    return None;
                }
            };

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_else(|| "Untitled".to_string());

            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|html| html_to_text(&html))
                .unwrap_or_default();

            let published_at = entry
                .published
                .or(entry.updated)
                .unwrap_or(fetched_at)
                .fixed_offset();

            let categories = entry
                .categories
                .into_iter()
                .map(|c| c.term)
                .collect();

            Some(Item {
                title,
                link,
                summary,
                published_at,
                categories,
            })
        })
        .collect();

    Ok(items)
}

/// Convert HTML content to plain text
fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 80)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| html.to_string())
}
