use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use listing_reaper::config::load_config;
///
/// let config = load_config(Path::new("reaper.toml")).unwrap();
/// println!("Search term: {}", config.search.term);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a crawl's output can be matched to the exact config
/// that produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub search_term: Option<String>,
    pub start_page: Option<u32>,
    pub total_page_count: Option<u32>,
    pub urls_only: bool,
    pub output_path: Option<String>,
}

/// Applies command-line overrides and re-validates the result
///
/// `urls_only` can only switch URL-only mode on, never off.
pub fn apply_overrides(
    mut config: Config,
    overrides: &ConfigOverrides,
) -> Result<Config, ConfigError> {
    if let Some(term) = &overrides.search_term {
        config.search.term = term.clone();
    }
    if let Some(start_page) = overrides.start_page {
        config.search.start_page = start_page;
    }
    if let Some(total_page_count) = overrides.total_page_count {
        config.search.total_page_count = total_page_count;
    }
    if overrides.urls_only {
        config.search.urls_only = true;
    }
    if let Some(path) = &overrides.output_path {
        config.output.path = path.clone();
    }

    validate(&config)?;
    Ok(config)
}
