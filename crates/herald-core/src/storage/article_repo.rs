use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::traits::ArticleStore;
use super::Database;
use crate::feed::{Article, NewArticle};
use crate::Result;

/// SQLite-backed article store
#[derive(Clone)]
pub struct ArticleRepository {
    db: Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    source_id: i64,
    title: String,
    link: String,
    summary: String,
    published_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            link: row.link,
            summary: row.summary,
            published_at: row.published_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
        }
    }
}

impl ArticleRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Find an article by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, delivered_at, created_at
            FROM articles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Find an article by its link
    pub async fn find_by_link(&self, link: &str) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, delivered_at, created_at
            FROM articles
            WHERE link = ?
            "#,
        )
        .bind(link)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Total number of stored articles
    pub async fn count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u64)
    }
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    async fn store(&self, article: &NewArticle) -> Result<bool> {
        // Only a link collision is ignored; foreign key violations still fail.
        let result = sqlx::query(
            r#"
            INSERT INTO articles (source_id, title, link, summary, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(link) DO NOTHING
            "#,
        )
        .bind(article.source_id)
        .bind(&article.title)
        .bind(&article.link)
        .bind(&article.summary)
        .bind(article.published_at)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pending_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, delivered_at, created_at
            FROM articles
            WHERE delivered_at IS NULL
              AND published_at >= ?
            ORDER BY published_at DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn mark_delivered(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET delivered_at = ?
            WHERE id = ? AND delivered_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
