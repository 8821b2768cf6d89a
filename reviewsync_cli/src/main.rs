mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "reviewsync")]
#[command(about = "Ingest storefront review listings into SQLite")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion pipeline for configured sources
    Ingest(commands::ingest::IngestArgs),
    /// Show stored review counts and aggregate metadata
    Stats(commands::stats::StatsArgs),
    /// List the configured sources
    Sources(commands::sources::SourcesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reviewsync_lib=info".parse().unwrap())
                .add_directive("reviewsync_scrape=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Ingest(args) => commands::ingest::run(args).await?,
        Commands::Stats(args) => commands::stats::run(args, &format)?,
        Commands::Sources(args) => commands::sources::run(args, &format)?,
    }

    Ok(())
}
