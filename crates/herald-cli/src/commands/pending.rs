use anyhow::Result;
use chrono::Utc;

use herald_core::{
    pipeline::delivery_cutoff,
    storage::{ArticleRepository, ArticleStore, Database},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let cutoff = delivery_cutoff(Utc::now(), config.sync.stale_window()?)?;

    let articles = ArticleRepository::new(db)
        .pending_since(cutoff, config.sync.delivery_batch_size)
        .await?;

    if articles.is_empty() {
        println!("No pending articles published since {}.", cutoff.format("%Y-%m-%d %H:%M"));
        return Ok(());
    }

    println!("Pending articles ({}):\n", articles.len());

    for article in &articles {
        println!("  [{}] {}", article.id, article.title);
        println!("    {}", article.link);
        println!("    Published: {}", article.published_at.format("%Y-%m-%d %H:%M"));
        println!();
    }

    Ok(())
}
