mod runner;
mod service;
mod shutdown;
mod ticker;

pub use runner::{run_periodic, PeriodicTask};
pub use service::{build_delivery_pipeline, build_ingest_pipeline, SchedulerService};
pub use shutdown::{is_shutdown, shutdown_channel, wait_for_shutdown, ShutdownSignal};
pub use ticker::{IntervalTicker, Ticker};
