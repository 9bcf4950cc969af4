use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Listing-Reaper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// What to search for and how far to page
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search string passed to the site
    pub term: String,

    /// First search-results page to fetch
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Number of search-results pages to traverse from the start page
    #[serde(rename = "total-page-count", default = "default_total_page_count")]
    pub total_page_count: u32,

    /// Emit only listing URLs, without visiting product pages
    #[serde(rename = "urls-only", default)]
    pub urls_only: bool,
}

/// Site endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host every request is built from
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path of the review-feed endpoint, relative to the base URL
    #[serde(rename = "review-endpoint", default = "default_review_endpoint")]
    pub review_endpoint: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            review_endpoint: default_review_endpoint(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(
        rename = "max-concurrent-requests",
        default = "default_max_concurrent_requests"
    )]
    pub max_concurrent_requests: u32,

    /// Per-request timeout (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the output file, or `-` for stdout
    pub path: String,

    /// Serialization format of the output file
    #[serde(default)]
    pub format: OutputFormat,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,

    /// A single JSON array
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jsonl => write!(f, "jsonl"),
            Self::Json => write!(f, "json"),
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_total_page_count() -> u32 {
    10
}

fn default_base_url() -> String {
    "https://www.etsy.com".to_string()
}

fn default_review_endpoint() -> String {
    "/api/v3/ajax/bespoke/member/neu/specs/reviews".to_string()
}

fn default_max_concurrent_requests() -> u32 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}
