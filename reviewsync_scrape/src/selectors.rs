//! CSS selectors for review listing pages.
//!
//! Listing markup varies per storefront and over time, so block location is
//! a prioritized cascade: selectors are tried in order and the first one
//! that matches anything on the page wins outright. Selectors lower in the
//! list are never mixed into the result. When parsing starts failing for a
//! source, capture an HTML sample, adjust here, and add a test fixture.

use std::sync::LazyLock;

use scraper::Selector;

/// Ordered cascade of "one review block" container selectors, most
/// structured markup first, loosest heuristic last.
pub static REVIEW_BLOCKS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "[data-review-id]",
        "div.review-listing-item",
        "article.review",
        "div.review-item, li.review-item",
        "div[class*='review-card']",
        "div[itemprop='review']",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("static selector"))
    .collect()
});

/// Elements carrying a machine-readable rating label.
pub static RATING_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[aria-label], [title*='out of']").expect("static selector")
});

/// Visually-filled rating icons, counted when no label is present.
pub static RATING_FILLED_ICON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".star.filled, \
         .icon-star-filled, \
         svg.filled-star, \
         i.fa-star:not(.fa-star-o), \
         span[class*='star--full']",
    )
    .expect("static selector")
});

/// `<time>` elements with a machine-readable datetime attribute.
pub static TIME_ELEMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime]").expect("static selector"));

/// Free-text date candidates.
pub static DATE_TEXT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".review-date, \
         .review-metadata__date, \
         span[class*='date'], \
         div[class*='date']",
    )
    .expect("static selector")
});

/// Short labels that usually carry the reviewer's country.
pub static COUNTRY_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[data-country], \
         .review-country, \
         .review-metadata__country, \
         span[class*='country'], \
         span[class*='location']",
    )
    .expect("static selector")
});

/// Heading-like elements for the subject (store/author) label.
pub static SUBJECT_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "h2, h3, h4, \
         .review-author, \
         .review-listing-header a, \
         strong",
    )
    .expect("static selector")
});

/// Candidate containers for the review body text.
pub static BODY_TEXT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".review-body, \
         .review-content, \
         [itemprop='reviewBody'], \
         p",
    )
    .expect("static selector")
});
