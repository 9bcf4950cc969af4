//! Output module for finished product records
//!
//! This module handles:
//! - The record type handed to sinks
//! - JSON Lines and JSON array sinks
//! - Recording crawl statistics

mod json;
mod record;
pub mod stats;
mod traits;

pub use json::{JsonArraySink, JsonLinesSink};
pub use record::OutputRecord;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{MemorySink, OutputError, OutputResult, RecordSink};

use crate::config::{OutputConfig, OutputFormat};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

/// Opens the sink described by the output configuration
///
/// A path of `-` writes to stdout.
///
/// # Returns
///
/// * `Ok(Box<dyn RecordSink>)` - Sink ready to receive records
/// * `Err(OutputError)` - The output file could not be created
pub fn open_sink(config: &OutputConfig) -> OutputResult<Box<dyn RecordSink>> {
    if config.path == "-" {
        let stdout = io::stdout();
        return Ok(match config.format {
            OutputFormat::Jsonl => Box::new(JsonLinesSink::new(stdout)),
            OutputFormat::Json => Box::new(JsonArraySink::new(stdout)),
        });
    }

    let path = Path::new(&config.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);

    tracing::info!("Writing {} records to {}", config.format, path.display());

    Ok(match config.format {
        OutputFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
        OutputFormat::Json => Box::new(JsonArraySink::new(writer)),
    })
}
