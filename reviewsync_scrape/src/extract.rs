//! Field extraction for a single review block.
//!
//! Every field is resolved through an ordered strategy chain: the first
//! strategy producing a usable value wins, and a missing field falls back
//! to a documented default instead of failing the record. The one
//! exception is the body text: a review without text is not useful, so an
//! empty body drops the whole record.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::Regex;
use scraper::ElementRef;

use crate::selectors;

/// Country names recognized in review metadata, mapped to short codes.
/// Anything absent from this table falls back to [`DEFAULT_COUNTRY`].
pub const COUNTRY_CODES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("united states of america", "US"),
    ("usa", "US"),
    ("united kingdom", "GB"),
    ("great britain", "GB"),
    ("england", "GB"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("new zealand", "NZ"),
    ("germany", "DE"),
    ("france", "FR"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("netherlands", "NL"),
    ("belgium", "BE"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
    ("finland", "FI"),
    ("ireland", "IE"),
    ("switzerland", "CH"),
    ("austria", "AT"),
    ("portugal", "PT"),
    ("poland", "PL"),
    ("brazil", "BR"),
    ("mexico", "MX"),
    ("argentina", "AR"),
    ("chile", "CL"),
    ("colombia", "CO"),
    ("india", "IN"),
    ("china", "CN"),
    ("hong kong", "HK"),
    ("japan", "JP"),
    ("south korea", "KR"),
    ("singapore", "SG"),
    ("malaysia", "MY"),
    ("indonesia", "ID"),
    ("philippines", "PH"),
    ("thailand", "TH"),
    ("vietnam", "VN"),
    ("israel", "IL"),
    ("turkey", "TR"),
    ("south africa", "ZA"),
    ("nigeria", "NG"),
    ("united arab emirates", "AE"),
];

/// Default country code when the label is missing or unrecognized. A known
/// approximation, not a correctness guarantee.
pub const DEFAULT_COUNTRY: &str = "US";

/// Subject placeholder when no heading-like text is found.
pub const UNKNOWN_SUBJECT: &str = "Unknown";

static RATING_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:out of|of|/)\s*5").expect("static regex")
});

static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(\d+)\s+)?(day|week|month|year)s?\s+ago\b").expect("static regex")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("static regex"));

static MONTH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec)\b",
    )
    .expect("static regex")
});

/// Knobs for field extraction, fixed per run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Rating used when neither a label nor filled icons are present.
    pub fallback_rating: u8,
    /// The calendar date relative expressions resolve against.
    pub today: NaiveDate,
    /// Text blocks shorter than this are treated as incidental labels.
    pub min_body_len: usize,
    /// Storage column limit; longer bodies are truncated.
    pub max_body_len: usize,
}

impl ExtractOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            fallback_rating: 5,
            today,
            min_body_len: 15,
            max_body_len: 4000,
        }
    }
}

/// One normalized review pulled out of a listing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedReview {
    pub author: String,
    pub country: String,
    pub rating: u8,
    pub body: String,
    pub posted: NaiveDate,
}

/// Extracts one review from a block element.
///
/// Returns `None` only when no body text clears the minimum length; every
/// other gap resolves to its default.
pub fn extract_review(block: ElementRef<'_>, opts: &ExtractOptions) -> Option<ExtractedReview> {
    let body = extract_body(block, opts)?;
    Some(ExtractedReview {
        author: extract_subject(block),
        country: extract_country(block),
        rating: extract_rating(block, opts.fallback_rating),
        body,
        posted: extract_date(block, opts.today),
    })
}

/// Rating strategies, in order: machine-readable "N out of 5" label,
/// count of filled star icons, configured fallback. Always clamped to 1..=5.
pub fn extract_rating(block: ElementRef<'_>, fallback: u8) -> u8 {
    for el in block.select(&selectors::RATING_LABEL) {
        let label = el
            .value()
            .attr("aria-label")
            .or_else(|| el.value().attr("title"))
            .unwrap_or_default();
        if let Some(rating) = rating_from_label(label) {
            return rating;
        }
    }

    let filled = block.select(&selectors::RATING_FILLED_ICON).count();
    if filled > 0 {
        return clamp_rating(filled as i64);
    }

    clamp_rating(fallback as i64)
}

fn rating_from_label(label: &str) -> Option<u8> {
    let caps = RATING_LABEL_RE.captures(label)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(clamp_rating(value.round() as i64))
}

fn clamp_rating(value: i64) -> u8 {
    value.clamp(1, 5) as u8
}

/// Date strategies, in order: `<time datetime>` attribute, absolute date
/// text, relative expression ("N days ago"). Unparseable text defaults to
/// `today`.
pub fn extract_date(block: ElementRef<'_>, today: NaiveDate) -> NaiveDate {
    for el in block.select(&selectors::TIME_ELEMENT) {
        if let Some(attr) = el.value().attr("datetime") {
            if let Some(date) = parse_absolute_date(attr) {
                return date;
            }
        }
    }

    for el in block.select(&selectors::DATE_TEXT) {
        let text = element_text(el);
        if text.is_empty() {
            continue;
        }
        if let Some(date) = parse_absolute_date(&text) {
            return date;
        }
        if let Some(date) = resolve_relative_date(&text, today) {
            return date;
        }
    }

    today
}

/// Parses the absolute date formats seen across listing markup.
pub fn parse_absolute_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // ISO timestamps: keep the calendar part only.
    let head = text.split(['T', ' ']).next().unwrap_or(text);
    if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}

/// Resolves "N days/weeks/months/years ago" against `today`. Best-effort:
/// months and years use calendar arithmetic with no timezone handling, and
/// a missing magnitude means 1. The listing treats these as exact; we keep
/// the same approximation.
pub fn resolve_relative_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lowered = text.trim().to_ascii_lowercase();
    if lowered == "today" || lowered == "just now" {
        return Some(today);
    }
    if lowered == "yesterday" {
        return today.checked_sub_days(Days::new(1));
    }

    let caps = RELATIVE_DATE_RE.captures(&lowered)?;
    let magnitude: u64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1);
    let unit = caps.get(2)?.as_str();
    match unit {
        "day" => today.checked_sub_days(Days::new(magnitude)),
        "week" => magnitude
            .checked_mul(7)
            .and_then(|days| today.checked_sub_days(Days::new(days))),
        "month" => today.checked_sub_months(Months::new(magnitude as u32)),
        "year" => {
            let year = today.year() - magnitude as i32;
            today
                .with_year(year)
                .or_else(|| NaiveDate::from_ymd_opt(year, today.month(), 28))
        }
        _ => None,
    }
}

/// Country strategies: short label near the block, filtered against
/// date-looking text (listing markup sometimes mis-positions the date
/// element), then the fixed name-to-code table. Two-letter uppercase codes
/// pass through; everything else defaults to [`DEFAULT_COUNTRY`].
pub fn extract_country(block: ElementRef<'_>) -> String {
    for el in block.select(&selectors::COUNTRY_LABEL) {
        let candidate = el
            .value()
            .attr("data-country")
            .map(str::to_string)
            .unwrap_or_else(|| element_text(el));
        if let Some(code) = normalize_country(&candidate) {
            return code;
        }
    }
    DEFAULT_COUNTRY.to_string()
}

fn normalize_country(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || looks_like_date(candidate) {
        return None;
    }
    let lowered = candidate.to_ascii_lowercase();
    if let Some((_, code)) = COUNTRY_CODES.iter().find(|(name, _)| *name == lowered) {
        return Some((*code).to_string());
    }
    if candidate.len() == 2 && candidate.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(candidate.to_string());
    }
    None
}

fn looks_like_date(text: &str) -> bool {
    YEAR_RE.is_match(text) || MONTH_NAME_RE.is_match(text)
}

/// First non-empty heading-like text, or the placeholder.
pub fn extract_subject(block: ElementRef<'_>) -> String {
    for el in block.select(&selectors::SUBJECT_HEADING) {
        let text = element_text(el);
        if !text.is_empty() {
            return text;
        }
    }
    UNKNOWN_SUBJECT.to_string()
}

/// First text block clearing the minimum length, truncated to the storage
/// limit on a char boundary. `None` when nothing qualifies.
pub fn extract_body(block: ElementRef<'_>, opts: &ExtractOptions) -> Option<String> {
    for el in block.select(&selectors::BODY_TEXT) {
        let text = element_text(el);
        if text.chars().count() >= opts.min_body_len {
            return Some(truncate_chars(&text, opts.max_body_len));
        }
    }
    None
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Collects an element's text with whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
