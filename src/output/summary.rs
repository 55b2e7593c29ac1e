//! Per-run summary of acquisition results

use crate::acquisition::AcquisitionReport;
use crate::record::SourceName;
use crate::state::Termination;
use std::fmt::Write;

/// Outcome of one source within a run
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub requested: SourceName,
    pub delivered_by: SourceName,
    pub strategy: &'static str,
    pub records: usize,
    pub pages_fetched: u32,
    pub termination: Termination,
    pub fallback_attempted: bool,
    pub fallback_used: bool,
    pub duration_ms: i64,
}

impl SourceSummary {
    pub fn from_report(report: &AcquisitionReport) -> Self {
        let delivered = &report.delivered;

        Self {
            requested: report.requested,
            delivered_by: delivered.source,
            strategy: delivered.strategy,
            records: delivered.records.len(),
            pages_fetched: delivered.pages_fetched,
            termination: delivered.termination,
            fallback_attempted: report.fallback_attempted,
            fallback_used: report.fallback_used(),
            duration_ms: report.total_duration().num_milliseconds(),
        }
    }
}

/// Summary of a whole run across sources
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub keyword: String,
    pub sources: Vec<SourceSummary>,
    /// Sources that failed before producing a report
    pub failures: Vec<(SourceName, String)>,
}

impl RunSummary {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    pub fn add_report(&mut self, report: &AcquisitionReport) {
        self.sources.push(SourceSummary::from_report(report));
    }

    pub fn add_failure(&mut self, source: SourceName, message: impl Into<String>) {
        self.failures.push((source, message.into()));
    }

    pub fn total_records(&self) -> usize {
        self.sources.iter().map(|s| s.records).sum()
    }

    /// Returns true if any source ended because the site blocked it
    pub fn any_interdicted(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.termination == Termination::Interdicted)
    }
}

/// Renders the summary as plain text
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Acquisition Summary ===\n");
    let _ = writeln!(out, "Keyword: {}", summary.keyword);
    let _ = writeln!(out, "Total records: {}\n", summary.total_records());

    if !summary.sources.is_empty() {
        let _ = writeln!(out, "Sources:");
        for source in &summary.sources {
            let _ = write!(
                out,
                "  {} ({}): {} records, {} pages via {}, {} in {:.1}s",
                source.requested,
                source.requested.display_name(),
                source.records,
                source.pages_fetched,
                source.strategy,
                source.termination.outcome(),
                source.duration_ms as f64 / 1000.0
            );
            if source.fallback_used {
                let _ = write!(out, " [fallback: {}]", source.delivered_by);
            } else if source.fallback_attempted {
                let _ = write!(out, " [fallback attempted, empty]");
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out);
    }

    if !summary.failures.is_empty() {
        let _ = writeln!(out, "Failed sources:");
        for (source, message) in &summary.failures {
            let _ = writeln!(out, "  {}: {}", source, message);
        }
        let _ = writeln!(out);
    }

    out
}

/// Prints the summary to stderr, keeping stdout free for records
pub fn print_summary(summary: &RunSummary) {
    eprint!("{}", render_summary(summary));
}
