//! JSON sinks for finished product records

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::output::OutputRecord;
use std::io::Write;

/// Writes one JSON object per line as records arrive
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
    finalized: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            finalized: false,
        }
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> OutputResult<()> {
        self.finalized = true;
        self.writer.flush()?;
        Ok(())
    }
}

/// Buffers records and writes them as a single JSON array on finalize
pub struct JsonArraySink<W: Write> {
    writer: W,
    records: Vec<OutputRecord>,
    finalized: bool,
}

impl<W: Write> JsonArraySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records: Vec::new(),
            finalized: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonArraySink<W> {
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finalize(&mut self) -> OutputResult<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        serde_json::to_writer_pretty(&mut self.writer, &self.records)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
