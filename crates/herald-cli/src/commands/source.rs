use anyhow::Result;

use herald_core::{
    feed::NewSource,
    storage::{Database, SourceRepository},
};

pub async fn add(db: &Database, name: &str, url: &str) -> Result<()> {
    let repo = SourceRepository::new(db);

    if let Some(existing) = repo.find_by_url(url).await? {
        println!("Source already registered: {} ({})", existing.name, existing.id);
        return Ok(());
    }

    let source = repo
        .add(&NewSource {
            name: name.to_string(),
            feed_url: url.to_string(),
        })
        .await?;

    println!("Added source: {} ({})", source.name, source.id);
    Ok(())
}

pub async fn remove(db: &Database, id: i64) -> Result<()> {
    let repo = SourceRepository::new(db);

    if repo.remove(id).await? {
        println!("Removed source {} and its articles.", id);
    } else {
        println!("Source {} not found.", id);
        println!("\nRun 'herald source list' to see registered sources.");
    }

    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let sources = SourceRepository::new(db).list_all().await?;

    if sources.is_empty() {
        println!("No sources yet.");
        println!("\nTo add a feed, run:");
        println!("  herald source add -n <name> -u <url>");
        return Ok(());
    }

    println!("Sources ({}):\n", sources.len());

    for source in &sources {
        println!("  [{}] {}", source.id, source.name);
        println!("    URL: {}", source.feed_url);
        println!("    Added: {}", source.created_at.format("%Y-%m-%d %H:%M"));
        println!();
    }

    Ok(())
}
