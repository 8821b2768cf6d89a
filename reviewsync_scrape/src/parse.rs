//! Listing parser: locates review blocks and runs field extraction.

use scraper::Html;

use crate::extract::{self, ExtractOptions, ExtractedReview};
use crate::selectors;

/// The parsed result of one listing page.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Review blocks located by the winning selector, before extraction.
    pub blocks_found: usize,
    /// Successfully extracted reviews, in listing order.
    pub reviews: Vec<ExtractedReview>,
}

impl ListingPage {
    /// A page with no recognizable review blocks. Expected at the end of
    /// pagination, not an error.
    pub fn is_empty(&self) -> bool {
        self.blocks_found == 0
    }
}

/// Parses one page of listing markup.
///
/// The block-selector cascade is committed to wholesale: the first selector
/// in [`selectors::REVIEW_BLOCKS`] that matches at least one element is
/// used exclusively, so incompatible DOM shapes are never mixed within one
/// page. Blocks whose body text cannot be extracted are dropped
/// individually; the rest of the page still parses.
pub fn parse_listing(html: &str, opts: &ExtractOptions) -> ListingPage {
    let document = Html::parse_document(html);

    for selector in selectors::REVIEW_BLOCKS.iter() {
        let blocks: Vec<_> = document.select(selector).collect();
        if blocks.is_empty() {
            continue;
        }

        let mut reviews = Vec::with_capacity(blocks.len());
        for block in &blocks {
            match extract::extract_review(*block, opts) {
                Some(review) => reviews.push(review),
                None => {
                    tracing::debug!("dropping review block without usable body text");
                }
            }
        }
        return ListingPage {
            blocks_found: blocks.len(),
            reviews,
        };
    }

    ListingPage::default()
}
