//! Input validation for CLI-supplied overrides.

use chrono::NaiveDate;

use crate::error::ReviewSyncError;

pub const MAX_RETENTION_DAYS: u64 = 3650;
pub const MAX_PAGE_CEILING: u32 = 500;

pub fn validate_retention_days(days: u64) -> Result<u64, ReviewSyncError> {
    if (1..=MAX_RETENTION_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ReviewSyncError::InvalidInput(format!(
            "retention days must be 1-{}, got {}",
            MAX_RETENTION_DAYS, days
        )))
    }
}

pub fn validate_max_pages(pages: u32) -> Result<u32, ReviewSyncError> {
    if (1..=MAX_PAGE_CEILING).contains(&pages) {
        Ok(pages)
    } else {
        Err(ReviewSyncError::InvalidInput(format!(
            "page ceiling must be 1-{}, got {}",
            MAX_PAGE_CEILING, pages
        )))
    }
}

pub fn validate_date(raw: &str) -> Result<NaiveDate, ReviewSyncError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ReviewSyncError::InvalidInput(format!("invalid date '{}' (expected YYYY-MM-DD)", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_bounds() {
        assert!(validate_retention_days(30).is_ok());
        assert!(validate_retention_days(0).is_err());
        assert!(validate_retention_days(4000).is_err());
    }

    #[test]
    fn page_ceiling_bounds() {
        assert!(validate_max_pages(50).is_ok());
        assert!(validate_max_pages(0).is_err());
        assert!(validate_max_pages(501).is_err());
    }

    #[test]
    fn date_format() {
        assert!(validate_date("2025-07-01").is_ok());
        assert!(validate_date("07/01/2025").is_err());
    }
}
