//! The `ingest` subcommand: run the pipeline and write into SQLite.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Args;
use tokio::time::sleep;

use reviewsync_lib::{
    aggregate_source, run_ingest, validation, Db, ScrapeClient, Source, SourcesFile, WriteMode,
    WriteSummary,
};

/// Arguments for the `ingest` subcommand.
#[derive(Args)]
pub struct IngestArgs {
    /// SQLite database path
    #[arg(long, default_value = "reviewsync.db")]
    pub db: PathBuf,

    /// Sources configuration file (TOML)
    #[arg(long, default_value = "sources.toml")]
    pub config: PathBuf,

    /// Source id(s) to ingest; all configured sources when omitted
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Override the write mode for this run (replace or merge)
    #[arg(long)]
    pub mode: Option<String>,

    /// Override the retention window in days
    #[arg(long)]
    pub retention_days: Option<u64>,

    /// Override the page-count ceiling
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Delay between sources in milliseconds
    #[arg(long, default_value = "1000")]
    pub source_delay_ms: u64,
}

pub async fn run(args: &IngestArgs) -> Result<()> {
    let file = SourcesFile::load(&args.config)?;
    let mode_override = args
        .mode
        .as_deref()
        .map(|s| s.parse::<WriteMode>())
        .transpose()?;
    if let Some(days) = args.retention_days {
        validation::validate_retention_days(days)?;
    }
    if let Some(pages) = args.max_pages {
        validation::validate_max_pages(pages)?;
    }

    let selected: Vec<Source> = if args.sources.is_empty() {
        file.sources.clone()
    } else {
        args.sources
            .iter()
            .map(|id| {
                file.find(id)
                    .cloned()
                    .ok_or_else(|| anyhow!("source '{}' not found in {}", id, args.config.display()))
            })
            .collect::<Result<_>>()?
    };

    let mut db = Db::open(&args.db)?;
    db.init()?;
    let client = ScrapeClient::new()?;

    // Base-URL override for test harnesses pointing at a local server.
    let base_override = std::env::var("REVIEWSYNC_BASE_URL").ok();

    let total = selected.len();
    for (idx, mut source) in selected.into_iter().enumerate() {
        if let Some(mode) = mode_override {
            source.mode = mode;
        }
        if let Some(days) = args.retention_days {
            source.retention_days = days;
        }
        if let Some(pages) = args.max_pages {
            source.max_pages = pages;
        }
        if let Some(ref base) = base_override {
            source.base_url = rebase_url(&source.base_url, base)?;
            source.summary_url = source
                .summary_url
                .as_deref()
                .map(|u| rebase_url(u, base))
                .transpose()?;
        }

        ingest_one(&client, &mut db, &source).await?;

        if idx + 1 < total && args.source_delay_ms > 0 {
            sleep(Duration::from_millis(args.source_delay_ms)).await;
        }
    }

    Ok(())
}

async fn ingest_one(client: &ScrapeClient, db: &mut Db, source: &Source) -> Result<()> {
    let today = Utc::now().date_naive();
    eprintln!(
        "Ingesting {} ({} mode, cutoff {})",
        source.display_name(),
        match source.mode {
            WriteMode::Replace => "replace",
            WriteMode::Merge => "merge",
        },
        source.cutoff(today)
    );

    let outcome = run_ingest(client, source, today).await?;

    let written: WriteSummary = match source.mode {
        WriteMode::Replace => db.replace_reviews(&source.id, &outcome.records)?,
        WriteMode::Merge => db.merge_reviews(&outcome.records)?,
    };

    aggregate_source(client, source, db).await?;
    db.set_meta(&format!("last_run:{}", source.id), &today.to_string())?;

    eprintln!(
        "{}: {} pages, {} blocks, {} kept ({}); wrote {} new, {} duplicate, {} failed",
        source.display_name(),
        outcome.pages_fetched,
        outcome.blocks_seen,
        outcome.records.len(),
        outcome.stop,
        written.inserted,
        written.duplicates,
        written.failed,
    );
    Ok(())
}

/// Swaps the scheme/host/port of `url` for those of `base`, keeping the path.
fn rebase_url(url: &str, base: &str) -> Result<String> {
    let original = url::Url::parse(url)?;
    let mut rebased = url::Url::parse(base)?;
    rebased.set_path(original.path());
    rebased.set_query(original.query());
    Ok(rebased.to_string())
}
