//! The extraction strategy seam
//!
//! A strategy turns "page N of the results for keyword K" into job records.
//! The pagination controller drives any strategy through the same calls:
//! `open` once, then `fetch_page` / `advance` per page, then `close` exactly once.

use crate::pacing::TimeoutError;
use crate::record::{JobRecord, SourceName};
use async_trait::async_trait;
use thiserror::Error;

/// Whether another page of results can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Available,
    /// Next control missing, disabled or unclickable
    Exhausted,
}

/// Faults a strategy reports to the pagination controller
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// A verification wall or CAPTCHA was detected
    #[error("interdiction detected: {signal}")]
    Interdicted { signal: String },

    /// The fetching resource could not be started
    #[error("resource initialization failed: {0}")]
    ResourceInit(String),

    /// A page-level fault (timeout, navigation failure, malformed page)
    #[error("page fault: {0}")]
    Page(String),
}

impl From<TimeoutError> for StrategyError {
    fn from(err: TimeoutError) -> Self {
        Self::Page(err.to_string())
    }
}

/// A mechanism for turning result pages into `JobRecord`s
#[async_trait]
pub trait ExtractionStrategy: Send {
    /// The source this strategy produces records for
    fn source(&self) -> SourceName;

    /// Short label used in logs and run summaries
    fn kind(&self) -> &'static str;

    /// Acquires resources and positions the strategy on page 1
    async fn open(&mut self, _keyword: &str) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Extracts every record on `page` (1-based)
    async fn fetch_page(&mut self, keyword: &str, page: u32)
        -> Result<Vec<JobRecord>, StrategyError>;

    /// Moves to the next page
    async fn advance(&mut self) -> Result<NextPage, StrategyError> {
        Ok(NextPage::Available)
    }

    /// Releases resources; called exactly once on every exit path
    async fn close(&mut self) {}
}
