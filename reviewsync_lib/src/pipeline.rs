//! Pagination controller: drives fetch → parse → evaluate per source.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::sleep;

use reviewsync_scrape::{parse, ExtractOptions, ScrapeClient};

use crate::db::ReviewRecord;
use crate::error::ReviewSyncError;
use crate::source::Source;

/// Why a run stopped. Observability only; callers branch on the
/// accumulated records, not on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page produced zero review blocks.
    EndOfListing,
    /// A record older than the cutoff was found; the listing is
    /// newest-first, so everything after it is out of scope too.
    CutoffReached,
    /// The page-count safety ceiling was hit.
    PageLimit,
    /// A fetch failed after retries; treated as no more data.
    FetchFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::EndOfListing => "end of listing",
            StopReason::CutoffReached => "cutoff reached",
            StopReason::PageLimit => "page limit",
            StopReason::FetchFailed => "fetch failed",
        };
        f.write_str(s)
    }
}

/// Terminal output of one ingestion run against one source.
#[derive(Debug)]
pub struct IngestOutcome {
    pub records: Vec<ReviewRecord>,
    pub pages_fetched: u32,
    pub blocks_seen: usize,
    pub stop: StopReason,
}

/// Runs the pagination loop for one source.
///
/// Pages are fetched sequentially, newest-first. Per page, records are
/// evaluated in listing order and the first one older than the cutoff
/// terminates the whole run; records before it are kept. Zero blocks, the
/// page ceiling, and an exhausted fetch also stop the run. Between pages
/// the loop sleeps `page_delay_ms` to avoid overloading the source.
///
/// Fetch failures are absorbed into the outcome (`StopReason::FetchFailed`)
/// rather than propagated: whatever was accumulated before the failure is
/// still returned, and the caller decides what to do with a short run.
pub async fn run_ingest(
    client: &ScrapeClient,
    source: &Source,
    today: NaiveDate,
) -> Result<IngestOutcome, ReviewSyncError> {
    let cutoff = source.cutoff(today);
    let mut opts = ExtractOptions::new(today);
    opts.fallback_rating = source.fallback_rating;

    let mut records: Vec<ReviewRecord> = Vec::new();
    let mut pages_fetched = 0u32;
    let mut blocks_seen = 0usize;
    let mut page = 1u32;

    let stop = loop {
        let url = source.listing_url(page)?;
        let html = match client.fetch_page(&url).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(
                    source = %source.id,
                    page,
                    error = %err,
                    "fetch failed, ending run"
                );
                break StopReason::FetchFailed;
            }
        };
        pages_fetched += 1;

        let listing = parse::parse_listing(&html, &opts);
        blocks_seen += listing.blocks_found;

        if listing.is_empty() {
            break StopReason::EndOfListing;
        }

        let mut hit_cutoff = false;
        let mut kept_on_page = 0usize;
        for review in listing.reviews {
            if review.posted < cutoff {
                hit_cutoff = true;
                break;
            }
            records.push(ReviewRecord::from_extracted(&source.id, review));
            kept_on_page += 1;
        }

        tracing::info!(
            source = %source.id,
            page,
            blocks = listing.blocks_found,
            kept = kept_on_page,
            "parsed listing page"
        );

        if hit_cutoff {
            break StopReason::CutoffReached;
        }
        if page >= source.max_pages {
            break StopReason::PageLimit;
        }

        page += 1;
        if source.page_delay_ms > 0 {
            sleep(Duration::from_millis(source.page_delay_ms)).await;
        }
    };

    tracing::info!(
        source = %source.id,
        pages = pages_fetched,
        blocks = blocks_seen,
        kept = records.len(),
        stop = %stop,
        "ingestion run finished"
    );

    Ok(IngestOutcome {
        records,
        pages_fetched,
        blocks_seen,
        stop,
    })
}
