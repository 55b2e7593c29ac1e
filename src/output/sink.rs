//! Record sinks
//!
//! Downstream consumers (normalization, aggregation, reporting) read the
//! acquired records as JSON lines, one `JobRecord` per line.

use crate::output::{OutputError, OutputResult};
use crate::record::JobRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination for acquired records
pub trait RecordSink {
    /// Writes a single record
    fn write_record(&mut self, record: &JobRecord) -> OutputResult<()>;

    /// Writes every record in order, returning how many were written
    fn write_all(&mut self, records: &[JobRecord]) -> OutputResult<usize> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(records.len())
    }

    /// Flushes buffered output
    fn finish(&mut self) -> OutputResult<()>;
}

/// Writes records as newline-delimited JSON
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path).map_err(|e| {
            OutputError::Write(format!("cannot create {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
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
    fn write_record(&mut self, record: &JobRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| OutputError::Format(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
