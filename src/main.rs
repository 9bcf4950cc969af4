//! Listing-Reaper main entry point
//!
//! This is the command-line interface for the Listing-Reaper harvester.

use anyhow::Context;
use clap::Parser;
use listing_reaper::config::{apply_overrides, load_config_with_hash, Config, ConfigOverrides};
use listing_reaper::crawler::run_crawl;
use listing_reaper::output::print_statistics;
use listing_reaper::state::PRODUCTS_PER_PAGE;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Listing-Reaper: a product search and review harvester
///
/// Listing-Reaper walks the search results for a term, reads every listing's
/// detail page, pages through the listing's reviews, and writes one record
/// per product.
#[derive(Parser, Debug)]
#[command(name = "listing-reaper")]
#[command(version = "1.0.0")]
#[command(about = "A product search and review harvester", long_about = None)]
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

    /// Search term, replacing the configured one
    #[arg(long, value_name = "TERM")]
    search: Option<String>,

    /// First search-results page to fetch
    #[arg(long, value_name = "PAGE")]
    start_page: Option<u32>,

    /// Number of search-results pages to traverse
    #[arg(long, value_name = "COUNT")]
    total_page_count: Option<u32>,

    /// Emit listing URLs only, skipping detail and review fetches
    #[arg(long)]
    urls_only: bool,

    /// Output file path, or `-` for stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let overrides = ConfigOverrides {
        search_term: cli.search,
        start_page: cli.start_page,
        total_page_count: cli.total_page_count,
        urls_only: cli.urls_only,
        output_path: cli.output,
    };
    let config = apply_overrides(config, &overrides).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so records written to stdout stay clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_reaper=info,warn"),
            1 => EnvFilter::new("listing_reaper=debug,info"),
            2 => EnvFilter::new("listing_reaper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Reaper Dry Run ===\n");

    println!("Search:");
    println!("  Term: {}", config.search.term);
    println!("  Start page: {}", config.search.start_page);
    println!("  Total page count: {}", config.search.total_page_count);
    println!("  URLs only: {}", config.search.urls_only);
    println!(
        "  Emission cap: {} records",
        u64::from(config.search.total_page_count) * PRODUCTS_PER_PAGE
    );

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Review endpoint: {}", config.site.review_endpoint);

    println!("\nCrawler:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Format: {}", config.output.format);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Searching for '{}' from page {} across {} pages",
        config.search.term,
        config.search.start_page,
        config.search.total_page_count
    );
    if config.search.urls_only {
        tracing::info!("URL-only mode: product pages will not be visited");
    }

    let stats = run_crawl(config).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    eprintln!();
    print_statistics(&stats);

    Ok(())
}
