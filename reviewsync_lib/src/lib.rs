//! Library layer for reviewsync: source configuration, the pagination
//! controller, the SQLite writer, and the metadata aggregator.
//!
//! Wraps the `reviewsync_scrape` crate with run orchestration, write-mode
//! semantics (full replace vs incremental merge), and per-source aggregate
//! rating metadata.

pub mod aggregate;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod validation;

pub use reviewsync_scrape;
pub use reviewsync_scrape::{ExtractOptions, ExtractedReview, FetchError, ScrapeClient};

pub use aggregate::aggregate_source;
pub use db::{AggregateMetadata, Db, DbError, ReviewRecord, WriteSummary};
pub use error::ReviewSyncError;
pub use pipeline::{run_ingest, IngestOutcome, StopReason};
pub use source::{Source, SourcesFile, WriteMode};
