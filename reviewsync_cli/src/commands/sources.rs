//! The `sources` subcommand: list configured sources.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use reviewsync_lib::SourcesFile;

use crate::output::{build_source_row, print_rows, OutputFormat};

/// Arguments for the `sources` subcommand.
#[derive(Args)]
pub struct SourcesArgs {
    /// Sources configuration file (TOML)
    #[arg(long, default_value = "sources.toml")]
    pub config: PathBuf,
}

pub fn run(args: &SourcesArgs, format: &OutputFormat) -> Result<()> {
    let file = SourcesFile::load(&args.config)?;
    let rows: Vec<_> = file.sources.iter().map(build_source_row).collect();
    print_rows(&rows, format)
}
