mod delivery;
mod filter;
mod ingest;

pub use delivery::{delivery_cutoff, DeliveryPipeline, DeliveryReport, DeliverySettings};
pub use filter::KeywordFilter;
pub use ingest::{IngestPipeline, IngestReport};
