mod client;
mod errors;
mod user_agent;
pub mod extract;
pub mod parse;
pub mod selectors;
pub mod summary;
pub use self::client::{RetryPolicy, ScrapeClient};
pub use self::errors::FetchError;
pub use self::extract::{ExtractOptions, ExtractedReview};
pub use self::parse::ListingPage;
pub use self::summary::SummarySignals;
