//! Output sink trait and error types
//!
//! A sink receives every finished record exactly once, from the single
//! driver loop that owns it.

use crate::output::OutputRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink already finalized")]
    Finalized,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
pub trait RecordSink {
    /// Hands one finished record to the sink
    ///
    /// Called at most once per product.
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()>;

    /// Flushes buffered output; no records may be emitted afterwards
    fn finalize(&mut self) -> OutputResult<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()> {
        (**self).emit(record)
    }

    fn finalize(&mut self) -> OutputResult<()> {
        (**self).finalize()
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<OutputRecord>,
    finalized: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OutputRecord> {
        self.records
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finalize(&mut self) -> OutputResult<()> {
        self.finalized = true;
        Ok(())
    }
}
