//! Error types for the library layer.

use std::fmt;

use crate::db::DbError;
use reviewsync_scrape::FetchError;

/// Errors produced by the library layer, wrapping fetch and storage errors
/// and adding configuration and input validation failures.
#[derive(Debug)]
pub enum ReviewSyncError {
    /// A fetch failed in a way the pipeline could not absorb.
    Fetch(FetchError),
    /// A storage operation failed.
    Db(DbError),
    /// The sources file could not be read or parsed.
    Config(String),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for ReviewSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch error: {}", e),
            Self::Db(e) => write!(f, "database error: {}", e),
            Self::Config(msg) => write!(f, "config error: {}", msg),
            Self::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ReviewSyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for ReviewSyncError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<DbError> for ReviewSyncError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}
