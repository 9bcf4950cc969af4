//! Crawler module for the search, detail, and review pipeline
//!
//! This module contains the core crawling logic, including:
//! - The catalog source seam and its HTTP implementation
//! - HTML and JSON extraction
//! - The synchronous crawl controller
//! - Overall crawl coordination

mod assembler;
mod controller;
mod coordinator;
mod fetcher;
mod parser;
mod source;

pub use assembler::assemble;
pub use controller::{CrawlAction, CrawlController, ReviewChain};
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, HttpCatalogSource};
pub use parser::{
    parse_product_detail, parse_review_fragment, parse_review_payload, parse_search_results,
};
pub use source::{Availability, CatalogSource, DetailResponse, ProductDetail, ProductReference};

use crate::config::Config;
use crate::output::{open_sink, CrawlStatistics};
use crate::ReaperError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and catalog source
/// 2. Open the configured output sink
/// 3. Walk search pages, product details, and review pages
/// 4. Finalize the output once the crawl ends or hits its cap
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed
/// * `Err(ReaperError)` - The source could not be built or the output failed
///
/// # Example
///
/// ```no_run
/// use listing_reaper::config::load_config;
/// use listing_reaper::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{} records", stats.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlStatistics, ReaperError> {
    let source = HttpCatalogSource::from_config(&config)?;
    let sink = open_sink(&config.output)?;

    let mut coordinator = Coordinator::new(source, sink, &config.search, &config.crawler);
    coordinator.run().await?;

    Ok(coordinator.stats().clone())
}
