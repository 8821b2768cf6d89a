//! Error types for the fetch layer.

use reqwest::StatusCode;

/// Errors that can occur when fetching a listing page.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// A transport-level failure (DNS, connection reset, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status and a body snippet.
    #[error("unexpected status {status}")]
    HttpStatus { status: StatusCode, body: String },
    /// All retry attempts for a transient failure were used up.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Transient failures are worth retrying: timeouts, transport errors,
    /// 5xx responses, and 429 rate limiting.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::Transport(_) => true,
            FetchError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::RetriesExhausted { .. } => false,
        }
    }

    /// Whether the terminal failure was a 429, which warrants a longer backoff.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            FetchError::HttpStatus { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS
        )
    }
}
