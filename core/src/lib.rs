//! NEO store: feed ingestion, SQLite schema and normalized reads
//!
//! Data flow: NeoWs feed -> [`ingest`] -> [`db`] (three tables) ->
//! [`normalize`] -> API consumers and the report crate.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod db;
pub mod errors;
pub mod feed;
pub mod feed_client;
pub mod ingest;
pub mod normalize;
pub mod store;

pub use config::NeoConfig;
pub use errors::{ErrorCategory, NeoError, Result};
pub use feed::{DiameterUnit, FeedResponse};
pub use feed_client::{FeedSource, NeoWsClient};
pub use ingest::{IngestCounts, IngestReport, IngestWindow, run_ingestion};
pub use normalize::NormalizedAsteroid;
pub use store::AsteroidStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
