//! Source configuration: one external review listing per entry.

use std::path::Path;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use url::Url;

use crate::error::ReviewSyncError;

/// Write strategy for one ingestion run.
///
/// `Replace` makes the store an exact mirror of the run's output for the
/// source; `Merge` only adds newly discovered records and never deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Replace,
    Merge,
}

impl FromStr for WriteMode {
    type Err = ReviewSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(WriteMode::Replace),
            "merge" => Ok(WriteMode::Merge),
            other => Err(ReviewSyncError::InvalidInput(format!(
                "unknown write mode '{}' (expected 'replace' or 'merge')",
                other
            ))),
        }
    }
}

/// One external listing the pipeline ingests from. Immutable per run.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    /// Stable identifier, partitions rows in the store.
    pub id: String,
    /// Human-readable name for logs and the `sources` command.
    #[serde(default)]
    pub name: Option<String>,
    /// Listing URL; `sort=newest` and `page=N` are appended per request.
    pub base_url: String,
    /// Optional summary page carrying total-count and average signals.
    #[serde(default)]
    pub summary_url: Option<String>,
    /// Records older than `today - retention_days` stop the run.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    /// Safety ceiling on pages fetched per run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub mode: WriteMode,
    /// Delay between page requests.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Rating used when a block exposes no rating signal at all.
    #[serde(default = "default_fallback_rating")]
    pub fallback_rating: u8,
    /// Last-resort metadata values when neither the summary page nor the
    /// stored rows yield a signal.
    #[serde(default)]
    pub fallback_total: Option<i64>,
    #[serde(default)]
    pub fallback_average: Option<f64>,
}

fn default_retention_days() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    50
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_fallback_rating() -> u8 {
    5
}

impl Source {
    /// Builds the listing URL for one page, with the sort order pinned to
    /// newest-first. The pagination contract depends on that ordering.
    pub fn listing_url(&self, page: u32) -> Result<String, ReviewSyncError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ReviewSyncError::Config(format!("invalid base_url for source '{}': {}", self.id, e))
        })?;
        url.query_pairs_mut()
            .append_pair("sort_by", "newest")
            .append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    /// Oldest date still in scope for a run starting on `today`.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(self.retention_days))
            .unwrap_or(today)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// The TOML sources file: `[[sources]]` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<Source>,
}

impl SourcesFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReviewSyncError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReviewSyncError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ReviewSyncError> {
        let file: SourcesFile = toml::from_str(raw)
            .map_err(|e| ReviewSyncError::Config(format!("invalid sources file: {}", e)))?;
        if file.sources.is_empty() {
            return Err(ReviewSyncError::Config(
                "sources file defines no sources".to_string(),
            ));
        }
        Ok(file)
    }

    pub fn find(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[sources]]
        id = "acme-app"
        name = "Acme App Reviews"
        base_url = "https://apps.example.com/acme/reviews"
        summary_url = "https://apps.example.com/acme"
        retention_days = 14
        mode = "merge"

        [[sources]]
        id = "other-app"
        base_url = "https://apps.example.com/other/reviews"
    "#;

    #[test]
    fn parses_sources_with_defaults() {
        let file = SourcesFile::parse(SAMPLE).unwrap();
        assert_eq!(file.sources.len(), 2);

        let acme = file.find("acme-app").unwrap();
        assert_eq!(acme.retention_days, 14);
        assert_eq!(acme.mode, WriteMode::Merge);

        let other = file.find("other-app").unwrap();
        assert_eq!(other.retention_days, 30);
        assert_eq!(other.max_pages, 50);
        assert_eq!(other.mode, WriteMode::Replace);
        assert_eq!(other.display_name(), "other-app");
    }

    #[test]
    fn listing_url_pins_sort_and_page() {
        let file = SourcesFile::parse(SAMPLE).unwrap();
        let url = file.find("acme-app").unwrap().listing_url(3).unwrap();
        assert!(url.contains("sort_by=newest"));
        assert!(url.contains("page=3"));
    }

    #[test]
    fn cutoff_subtracts_retention_window() {
        let file = SourcesFile::parse(SAMPLE).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 7, 28).unwrap();
        assert_eq!(
            file.find("acme-app").unwrap().cutoff(today),
            NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()
        );
    }

    #[test]
    fn empty_sources_file_is_rejected() {
        assert!(SourcesFile::parse("sources = []").is_err());
    }
}
