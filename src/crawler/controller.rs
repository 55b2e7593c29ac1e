//! Pagination crawl controller - main crawl orchestration logic
//!
//! Drives one extraction strategy across a bounded page range:
//! - Opening the strategy's resources
//! - Fetching pages strictly in order and accumulating their records
//! - Detecting end of results and interdiction
//! - Closing the strategy on every exit path

use crate::crawler::strategy::{ExtractionStrategy, NextPage, StrategyError};
use crate::record::{JobRecord, SourceName};
use crate::state::{CrawlCursor, Termination};
use crate::ScoutError;
use chrono::{DateTime, Utc};

/// Outcome of one crawl run: every record collected plus how the run ended
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub source: SourceName,
    /// Strategy label (`http`, `browser`, `api`)
    pub strategy: &'static str,
    pub keyword: String,
    pub records: Vec<JobRecord>,
    pub termination: Termination,
    pub pages_fetched: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Orchestrates a strategy over `CrawlCursor`
pub struct PaginationController<S> {
    strategy: S,
}

impl<S: ExtractionStrategy> PaginationController<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Returns the wrapped strategy
    pub fn into_inner(self) -> S {
        self.strategy
    }

    /// Runs a complete crawl for `keyword` over at most `target_pages` pages
    ///
    /// Records collected before any early termination are always returned.
    /// The strategy is closed before this returns, whatever the outcome.
    pub async fn run(&mut self, keyword: &str, target_pages: u32) -> Result<CrawlReport, ScoutError> {
        if target_pages == 0 {
            return Err(ScoutError::InvalidPageCount);
        }

        let started_at = Utc::now();
        let source = self.strategy.source();
        let mut cursor = CrawlCursor::new(target_pages);
        let mut records = Vec::new();

        tracing::info!(
            "Starting {} crawl of {} for '{}' ({} pages)",
            self.strategy.kind(),
            source,
            keyword,
            target_pages
        );

        let driven = self.drive(keyword, &mut cursor, &mut records).await;
        self.strategy.close().await;
        driven?;

        let termination = cursor.termination().unwrap_or(Termination::EndOfResults);
        let finished_at = Utc::now();

        tracing::info!(
            "Crawl of {} finished ({}): {} records from {} pages in {:.1}s",
            source,
            termination,
            records.len(),
            cursor.pages_fetched(),
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0
        );

        Ok(CrawlReport {
            source,
            strategy: self.strategy.kind(),
            keyword: keyword.to_string(),
            records,
            termination,
            pages_fetched: cursor.pages_fetched(),
            started_at,
            finished_at,
        })
    }

    /// The crawl loop; returns once `cursor` is terminal
    async fn drive(
        &mut self,
        keyword: &str,
        cursor: &mut CrawlCursor,
        records: &mut Vec<JobRecord>,
    ) -> Result<(), ScoutError> {
        let source = self.strategy.source();

        if let Err(e) = self.strategy.open(keyword).await {
            let termination = match &e {
                StrategyError::Interdicted { .. } => Termination::Interdicted,
                StrategyError::ResourceInit(_) => Termination::ResourceFailure,
                StrategyError::Page(_) => Termination::EndOfResults,
            };
            log_fault(source, 0, &e);
            return cursor.terminate(termination);
        }

        loop {
            cursor.begin_page()?;
            let page = cursor.current_page();

            tracing::info!(
                "Fetching page {}/{} from {}",
                page,
                cursor.target_page_count(),
                source
            );

            let page_records = match self.strategy.fetch_page(keyword, page).await {
                Ok(page_records) => page_records,
                Err(e @ StrategyError::Interdicted { .. }) => {
                    log_fault(source, page, &e);
                    return cursor.terminate(Termination::Interdicted);
                }
                Err(e @ StrategyError::ResourceInit(_)) => {
                    log_fault(source, page, &e);
                    return cursor.terminate(Termination::ResourceFailure);
                }
                Err(e @ StrategyError::Page(_)) => {
                    log_fault(source, page, &e);
                    Vec::new()
                }
            };

            let yielded = page_records.len();
            records.extend(page_records);
            cursor.page_yielded(yielded)?;

            if cursor.state().is_terminal() {
                tracing::info!("Page {} of {} yielded no records, end of results", page, source);
                return Ok(());
            }

            tracing::info!(
                "Page {} of {} yielded {} records ({} total)",
                page,
                source,
                yielded,
                records.len()
            );

            if cursor.on_last_page() {
                cursor.advance()?;
                tracing::info!("Reached page limit of {} for {}", page, source);
                return Ok(());
            }

            match self.strategy.advance().await {
                Ok(NextPage::Available) => {
                    cursor.advance()?;
                    tracing::info!("Advancing {} to page {}", source, cursor.current_page());
                }
                Ok(NextPage::Exhausted) => {
                    tracing::info!("No next page after page {} of {}", page, source);
                    return cursor.terminate(Termination::EndOfResults);
                }
                Err(e @ StrategyError::Interdicted { .. }) => {
                    log_fault(source, page, &e);
                    return cursor.terminate(Termination::Interdicted);
                }
                Err(e) => {
                    tracing::warn!(
                        "Pagination of {} failed after page {}: {}; treating as end of results",
                        source,
                        page,
                        e
                    );
                    return cursor.terminate(Termination::EndOfResults);
                }
            }
        }
    }
}

fn log_fault(source: SourceName, page: u32, err: &StrategyError) {
    match err {
        StrategyError::Interdicted { .. } => {
            tracing::error!("{} blocked the crawl at page {}: {}", source, page, err)
        }
        StrategyError::ResourceInit(_) => {
            tracing::error!("{} crawl could not start: {}", source, err)
        }
        StrategyError::Page(_) => {
            tracing::warn!("{} page {} failed: {}", source, page, err)
        }
    }
}
