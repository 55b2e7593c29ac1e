//! Output module for acquired records and run summaries
//!
//! This module handles:
//! - Writing records as JSON lines for downstream stages
//! - Summarizing each source's outcome at the end of a run

mod sink;
mod summary;

pub use sink::{JsonLinesSink, RecordSink};
pub use summary::{print_summary, render_summary, RunSummary, SourceSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
