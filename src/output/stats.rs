//! Statistics gathered over one crawl
//!
//! The driver loop owns the statistics and updates them between fetches,
//! so plain counters suffice here.

use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the crawl finished, once it has
    pub finished_at: Option<DateTime<Utc>>,

    /// Search-results pages fetched successfully
    pub search_pages_fetched: u64,

    /// Product references found across all search pages
    pub references_found: u64,

    /// Product detail pages fetched successfully
    pub detail_fetches: u64,

    /// Review pages fetched successfully
    pub review_fetches: u64,

    /// Products dropped because the listing was unavailable
    pub products_unavailable: u64,

    /// Products whose pipeline failed (fetch or extraction error)
    pub products_failed: u64,

    /// Search pages whose fetch failed
    pub search_pages_failed: u64,

    /// Records handed to the sink
    pub records_emitted: u64,

    /// Records that were ready but arrived after the cap was hit
    pub records_discarded: u64,

    /// Whether the emission cap aborted the crawl
    pub aborted_by_cap: bool,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            search_pages_fetched: 0,
            references_found: 0,
            detail_fetches: 0,
            review_fetches: 0,
            products_unavailable: 0,
            products_failed: 0,
            search_pages_failed: 0,
            records_emitted: 0,
            records_discarded: 0,
            aborted_by_cap: false,
        }
    }

    /// Marks the crawl as finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Seconds between start and finish
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Total number of fetches that succeeded
    pub fn total_fetches(&self) -> u64 {
        self.search_pages_fetched + self.detail_fetches + self.review_fetches
    }
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints statistics to stderr, keeping stdout free for records
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("=== Crawl Statistics ===\n");
    eprintln!("Started:  {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        eprintln!("Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = stats.duration_seconds() {
        eprintln!("Duration: {}s", seconds);
    }

    eprintln!("\nFetches:");
    eprintln!("  Search pages:    {}", stats.search_pages_fetched);
    eprintln!("  Product details: {}", stats.detail_fetches);
    eprintln!("  Review pages:    {}", stats.review_fetches);

    eprintln!("\nProducts:");
    eprintln!("  References found: {}", stats.references_found);
    eprintln!("  Unavailable:      {}", stats.products_unavailable);
    eprintln!("  Failed:           {}", stats.products_failed);

    eprintln!("\nOutput:");
    eprintln!("  Records emitted:   {}", stats.records_emitted);
    eprintln!("  Records discarded: {}", stats.records_discarded);

    if stats.search_pages_failed > 0 {
        eprintln!("\nSearch pages failed: {}", stats.search_pages_failed);
    }
    if stats.aborted_by_cap {
        eprintln!("\nCrawl stopped at the emission cap");
    }
}
