//! Configuration module for Listing-Reaper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use listing_reaper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reaper.toml")).unwrap();
//! println!("Searching for: {}", config.search.term);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, OutputFormat, SearchConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
    ConfigOverrides,
};
