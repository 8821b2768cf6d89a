//! Summary page parser: total review count and average rating signals.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static REVIEWS_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)reviews?\s*\(\s*([\d,]+)\s*\)").expect("static regex")
});

static AVERAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d(?:\.\d+)?)\s*(?:out of|of|/)\s*5").expect("static regex")
});

static RATING_VALUE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='ratingValue'], .rating-value").expect("static selector")
});

static REVIEW_COUNT_ATTR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='reviewCount'], [data-review-count]").expect("static selector")
});

/// Signals pulled from a source's summary page. Either may be absent; the
/// aggregator decides what to fall back to.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SummarySignals {
    pub total: Option<i64>,
    pub average: Option<f64>,
}

/// Parses the summary page for a labeled count ("Reviews (1,234)") and a
/// labeled average ("4.6 out of 5"). Structured microdata attributes take
/// priority over the text patterns.
pub fn parse_summary(html: &str) -> SummarySignals {
    let document = Html::parse_document(html);

    let mut total = document
        .select(&REVIEW_COUNT_ATTR)
        .find_map(|el| {
            el.value()
                .attr("content")
                .or_else(|| el.value().attr("data-review-count"))
                .and_then(parse_count)
                .or_else(|| parse_count(&el.text().collect::<String>()))
        });

    let mut average = document.select(&RATING_VALUE).find_map(|el| {
        el.value()
            .attr("content")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .or_else(|| el.text().collect::<String>().trim().parse::<f64>().ok())
    });

    let text = document.root_element().text().collect::<String>();
    if total.is_none() {
        total = REVIEWS_COUNT_RE
            .captures(&text)
            .and_then(|caps| parse_count(caps.get(1).map(|m| m.as_str()).unwrap_or_default()));
    }
    if average.is_none() {
        average = AVERAGE_RE
            .captures(&text)
            .and_then(|caps| caps.get(1)?.as_str().parse().ok());
    }

    SummarySignals { total, average }
}

fn parse_count(raw: &str) -> Option<i64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}
