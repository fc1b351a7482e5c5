use std::fmt::Display;

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::shutdown::{wait_for_shutdown, ShutdownSignal};
use super::ticker::Ticker;
use crate::{Error, Result};

/// One unit of periodic work, run once per tick
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    type Report: Display + Send;

    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Run one cycle. Returning `Error::Cancelled` stops the loop.
    async fn run_once(&self, shutdown: &ShutdownSignal) -> Result<Self::Report>;
}

/// Run `task` on every tick until shutdown.
///
/// A failed cycle is logged and retried on the next tick; only shutdown ends the
/// loop, which then returns `Error::Cancelled`. Shutdown is checked before every
/// tick, so a loop cancelled up front never runs a cycle.
pub async fn run_periodic<T, K>(task: &T, mut ticker: K, mut shutdown: ShutdownSignal) -> Result<()>
where
    T: PeriodicTask + ?Sized,
    K: Ticker,
{
    let name = task.name();
    info!("{} loop started", name);

    loop {
        tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown) => {
                info!("{} loop received shutdown signal", name);
                return Err(Error::Cancelled);
            }

            _ = ticker.tick() => {}
        }

        debug!("Running {} cycle", name);
        match task.run_once(&shutdown).await {
            Ok(report) => info!("{} cycle finished: {}", name, report),
            Err(Error::Cancelled) => {
                info!("{} cycle interrupted by shutdown", name);
                return Err(Error::Cancelled);
            }
            Err(e) => error!("{} cycle failed: {}", name, e),
        }
    }
}
