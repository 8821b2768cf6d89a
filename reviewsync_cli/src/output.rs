use anyhow::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use reviewsync_lib::{AggregateMetadata, Source};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
pub struct StatsRow {
    #[tabled(rename = "Source")]
    #[serde(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Stored")]
    #[serde(rename = "Stored")]
    pub stored: i64,
    #[tabled(rename = "Total")]
    #[serde(rename = "Total")]
    pub total: String,
    #[tabled(rename = "Average")]
    #[serde(rename = "Average")]
    pub average: String,
    #[tabled(rename = "Histogram (1-5)")]
    #[serde(rename = "Histogram")]
    pub histogram: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    pub updated_at: String,
}

#[derive(Tabled, Serialize)]
pub struct SourceRow {
    #[tabled(rename = "Id")]
    #[serde(rename = "Id")]
    pub id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Mode")]
    #[serde(rename = "Mode")]
    pub mode: String,
    #[tabled(rename = "Retention")]
    #[serde(rename = "Retention")]
    pub retention_days: u64,
    #[tabled(rename = "Max Pages")]
    #[serde(rename = "MaxPages")]
    pub max_pages: u32,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    pub base_url: String,
}

pub fn build_stats_row(source_id: &str, stored: i64, meta: Option<&AggregateMetadata>) -> StatsRow {
    StatsRow {
        source: source_id.to_string(),
        stored,
        total: meta
            .map(|m| m.total_reviews.to_string())
            .unwrap_or_else(|| "-".to_string()),
        average: meta
            .map(|m| format!("{:.2}", m.average_rating))
            .unwrap_or_else(|| "-".to_string()),
        histogram: meta
            .map(|m| {
                m.histogram
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|| "-".to_string()),
        updated_at: meta
            .map(|m| m.updated_at.clone())
            .unwrap_or_else(|| "-".to_string()),
    }
}

pub fn build_source_row(source: &Source) -> SourceRow {
    SourceRow {
        id: source.id.clone(),
        name: source.display_name().to_string(),
        mode: format!("{:?}", source.mode).to_lowercase(),
        retention_days: source.retention_days,
        max_pages: source.max_pages,
        base_url: source.base_url.clone(),
    }
}

pub fn print_rows<T: Tabled + Serialize>(rows: &[T], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?);
        }
    }
    Ok(())
}
