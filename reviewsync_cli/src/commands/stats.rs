//! The `stats` subcommand: stored counts and aggregate metadata.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use reviewsync_lib::Db;

use crate::output::{build_stats_row, print_rows, OutputFormat};

/// Arguments for the `stats` subcommand.
#[derive(Args)]
pub struct StatsArgs {
    /// SQLite database path
    #[arg(long, default_value = "reviewsync.db")]
    pub db: PathBuf,
}

pub fn run(args: &StatsArgs, format: &OutputFormat) -> Result<()> {
    let db = Db::open(&args.db)?;
    db.init()?;

    let counts = db.list_source_counts()?;
    if counts.is_empty() {
        eprintln!("No reviews stored yet.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(counts.len());
    for (source_id, stored) in counts {
        let meta = db.get_metadata(&source_id)?;
        rows.push(build_stats_row(&source_id, stored, meta.as_ref()));
    }
    print_rows(&rows, format)
}
