use anyhow::Result;

use herald_core::{
    scheduler::{build_ingest_pipeline, shutdown_channel},
    storage::Database,
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!("Fetching all sources...\n");

    let pipeline = build_ingest_pipeline(db, config)?;
    let (_shutdown_tx, shutdown_rx) = shutdown_channel();
    let report = pipeline.run_cycle(&shutdown_rx).await?;

    println!("\nFetch complete. {} new articles stored.", report.inserted);
    println!("  {}", report);

    Ok(())
}
