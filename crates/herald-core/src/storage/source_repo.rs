use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use url::Url;

use super::traits::SourceRegistry;
use super::Database;
use crate::feed::{NewSource, Source};
use crate::{Error, Result};

/// Repository for configured sources
#[derive(Clone)]
pub struct SourceRepository {
    db: Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    feed_url: String,
    created_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            feed_url: row.feed_url,
            created_at: row.created_at,
        }
    }
}

impl SourceRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Register a new source
    pub async fn add(&self, new_source: &NewSource) -> Result<Source> {
        let name = new_source.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("source name must not be empty".to_string()));
        }
        let feed_url = Url::parse(new_source.feed_url.trim())?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sources (name, feed_url, created_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(feed_url.as_str())
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::SourceNotFound(id.to_string()))
    }

    /// Find a source by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row: Option<SourceRow> = sqlx::query_as(
            "SELECT id, name, feed_url, created_at FROM sources WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }

    /// Find a source by feed URL, compared in the normalized form `add` stores
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Source>> {
        let url = Url::parse(url.trim())?;
        let row: Option<SourceRow> = sqlx::query_as(
            "SELECT id, name, feed_url, created_at FROM sources WHERE feed_url = ?",
        )
        .bind(url.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }

    /// Get all sources
    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(
            "SELECT id, name, feed_url, created_at FROM sources ORDER BY id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Remove a source and, by cascade, its articles
    pub async fn remove(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SourceRegistry for SourceRepository {
    async fn list(&self) -> Result<Vec<Source>> {
        self.list_all().await
    }
}
