pub mod datasets;
pub mod ingest;
pub mod mining_stats;
pub mod polling;
pub mod refresh;

pub use ingest::{IngestError, IngestJob, IngestSummary};
pub use refresh::{Origin, RefreshOrchestrator, Resolution};
