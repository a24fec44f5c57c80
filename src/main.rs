//! Strippi main entry point
//!
//! Command-line interface for the comic strip archive indexer.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strippi::config::load_config_with_hash;
use strippi::crawl::CrawlEngine;
use strippi::fetch::{build_http_client, PageFetcher, SiteFetcher};
use strippi::images::ImageStore;
use strippi::index::Index;
use strippi::schedule::{self, LogDelivery};
use strippi::service::ComicService;
use tracing_subscriber::EnvFilter;

/// Strippi: a comic strip archive indexer
///
/// Strippi crawls a newspaper's comic archive backward through each strip's
/// history, keeps the discovered strips in SQLite, and drives the daily
/// refresh/post cycle for subscribed destinations.
#[derive(Parser, Debug)]
#[command(name = "strippi")]
#[command(version = "1.0.0")]
#[command(about = "A comic strip archive indexer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run one index refresh and exit
    #[arg(long, conflicts_with = "stats")]
    refresh: bool,

    /// Show per-source statistics from the database and exit
    #[arg(long, conflicts_with = "refresh")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.stats {
        return handle_stats(&config).await;
    }

    // Wire up the index, fetcher, and service
    let index = Index::open(Path::new(&config.storage.database_path))?;
    let client = build_http_client(&config.http)?;
    let fetcher: Arc<dyn PageFetcher> = Arc::new(SiteFetcher::new(client, &config.site)?);
    let images = Arc::new(ImageStore::new(config.storage.image_dir.clone())?);
    let engine = CrawlEngine::new(
        fetcher.clone(),
        index.clone(),
        images,
        config.crawl.max_depth,
    );
    let service = ComicService::new(index, engine, fetcher);

    if cli.refresh {
        return handle_refresh(&service).await;
    }

    handle_daemon(&service, &config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("strippi=info,warn"),
            1 => EnvFilter::new("strippi=debug,info"),
            2 => EnvFilter::new("strippi=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --refresh mode: one index refresh, then exit
async fn handle_refresh(service: &ComicService) -> anyhow::Result<()> {
    let report = service.refresh_all().await?;

    println!(
        "Refreshed {} sources: {} new entries, {} failures",
        report.sources, report.new_entries, report.failures
    );

    Ok(())
}

/// Handles the --stats mode: shows per-source statistics from the database
async fn handle_stats(config: &strippi::config::Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let index = Index::open(Path::new(&config.storage.database_path))?;
    let stats = index.source_stats().await?;

    if stats.is_empty() {
        println!("No sources indexed yet");
        return Ok(());
    }

    for source in stats {
        match source.latest_date {
            Some(latest) => println!(
                "  {} — {} strips, latest {}",
                source.name, source.entry_count, latest
            ),
            None => println!("  {} — no strips yet", source.name),
        }
    }

    Ok(())
}

/// Handles the default mode: initial refresh, then the daily cycle
async fn handle_daemon(
    service: &ComicService,
    config: &strippi::config::Config,
) -> anyhow::Result<()> {
    tracing::info!("Running initial index refresh");
    if let Err(e) = service.refresh_all().await {
        // The daemon stays up; the scheduled refresh will retry tomorrow
        tracing::error!("Initial refresh failed: {}", e);
    }

    tracing::info!(
        "Entering daily cycle (refresh {}, post {})",
        config.schedule.refresh_time,
        config.schedule.post_time
    );
    schedule::run(service, &LogDelivery, &config.schedule).await?;

    Ok(())
}
