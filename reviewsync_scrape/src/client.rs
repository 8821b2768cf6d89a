//! HTTP client for storefront review listings.

use std::time::Duration;

use tokio::time::sleep;

use crate::errors::FetchError;
use crate::user_agent::get_user_agent;

/// Retry behavior for transient fetch failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Base delay; attempt n waits `base_delay * n`.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after a 429 response.
    pub rate_limit_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            rate_limit_factor: 4,
        }
    }
}

/// HTTP client for review listing and summary pages.
///
/// Sends requests with browser-like headers and a randomized user agent.
/// Follows redirects (reqwest default) and applies a 30-second timeout.
pub struct ScrapeClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl ScrapeClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_retry(RetryPolicy::default())
    }

    pub fn with_retry(retry: RetryPolicy) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, retry })
    }

    /// Fetches one page of markup, retrying transient failures.
    ///
    /// Timeouts, transport errors, 5xx and 429 are retried with a linearly
    /// increasing delay; a 429 waits `rate_limit_factor` times longer. Any
    /// other non-success status fails immediately. When retries run out the
    /// typed error is returned as-is: the caller decides whether that means
    /// "no more data" for its run.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut last: Option<FetchError> = None;
        for attempt in 1..=self.retry.max_attempts.max(1) {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        url,
                        attempt,
                        error = %err,
                        "transient fetch failure"
                    );
                    if attempt < self.retry.max_attempts {
                        let mut delay = self.retry.base_delay * attempt;
                        if err.is_rate_limited() {
                            delay *= self.retry.rate_limit_factor;
                        }
                        sleep(delay).await;
                    }
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(FetchError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last: Box::new(last.unwrap_or(FetchError::Timeout)),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("cache-control", "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
