use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use herald_core::{scheduler::SchedulerService, storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let scheduler = SchedulerService::from_config(db, config)?;

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Setup signal handlers for graceful shutdown
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    println!("Herald started. Press Ctrl+C to stop.");
    println!("  Fetch interval: {} seconds", config.sync.fetch_interval_secs);
    println!("  Delivery interval: {} seconds", config.sync.delivery_interval_secs);

    // Blocks until both loops have stopped
    scheduler.run(shutdown_rx).await?;

    println!("Herald stopped.");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(_) => {
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
