pub mod ingest;
pub mod sources;
pub mod stats;
