pub mod ai;
pub mod config;
pub mod error;
pub mod feed;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use error::{Error, Result};
