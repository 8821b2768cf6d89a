//! Metadata aggregator: per-source totals, average, and star histogram.

use chrono::Utc;

use reviewsync_scrape::{summary, ScrapeClient, SummarySignals};

use crate::db::{AggregateMetadata, Db};
use crate::error::ReviewSyncError;
use crate::source::Source;

/// Recomputes and upserts the aggregate metadata row for one source.
///
/// Signal precedence: the summary page (when configured and reachable),
/// then the stored rows, then the source's configured fallback values.
/// The histogram always derives from stored rows. A missing or failing
/// summary page never fails the run.
pub async fn aggregate_source(
    client: &ScrapeClient,
    source: &Source,
    db: &Db,
) -> Result<AggregateMetadata, ReviewSyncError> {
    let signals = match &source.summary_url {
        Some(url) => match client.fetch_page(url).await {
            Ok(html) => summary::parse_summary(&html),
            Err(err) => {
                tracing::warn!(
                    source = %source.id,
                    error = %err,
                    "summary page unavailable, deriving from stored rows"
                );
                SummarySignals::default()
            }
        },
        None => SummarySignals::default(),
    };

    let histogram = db.rating_histogram(&source.id)?;
    let stored: i64 = histogram.iter().sum();

    let total = signals
        .total
        .or(if stored > 0 { Some(stored) } else { None })
        .or(source.fallback_total)
        .unwrap_or(0);

    let average = signals
        .average
        .or_else(|| histogram_mean(&histogram))
        .or(source.fallback_average)
        .unwrap_or(0.0);

    let meta = AggregateMetadata {
        source_id: source.id.clone(),
        total_reviews: total,
        average_rating: average,
        histogram,
        updated_at: Utc::now().to_rfc3339(),
    };
    db.upsert_metadata(&meta)?;

    tracing::info!(
        source = %source.id,
        total = meta.total_reviews,
        average = meta.average_rating,
        "aggregate metadata updated"
    );
    Ok(meta)
}

/// Average rating from a star histogram; `None` when it is empty.
pub fn histogram_mean(histogram: &[i64; 5]) -> Option<f64> {
    let count: i64 = histogram.iter().sum();
    if count == 0 {
        return None;
    }
    let weighted: i64 = histogram
        .iter()
        .enumerate()
        .map(|(i, n)| (i as i64 + 1) * n)
        .sum();
    Some(weighted as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_histogram_is_none() {
        assert_eq!(histogram_mean(&[0; 5]), None);
    }

    #[test]
    fn mean_weights_by_star_value() {
        // Two 5-star, one 1-star, one 4-star: (5*2 + 1 + 4) / 4 = 3.75
        assert_eq!(histogram_mean(&[1, 0, 0, 1, 2]), Some(3.75));
    }
}
