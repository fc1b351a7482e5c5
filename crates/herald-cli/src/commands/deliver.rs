use anyhow::Result;

use herald_core::{
    scheduler::{build_delivery_pipeline, shutdown_channel},
    storage::Database,
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let pipeline = build_delivery_pipeline(db, config)?;
    let (_shutdown_tx, shutdown_rx) = shutdown_channel();
    let report = pipeline.run_cycle(&shutdown_rx).await?;

    if report.selected == 0 {
        println!("Nothing to deliver.");
        return Ok(());
    }

    println!("Delivered {} of {} pending articles.", report.delivered, report.selected);
    if report.failed > 0 {
        println!("{} articles failed and will be retried on the next run.", report.failed);
    }

    Ok(())
}
