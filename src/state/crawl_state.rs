/// Crawl state definitions for tracking pagination progress
///
/// This module defines the states a single crawl run moves through and the
/// cursor the pagination controller mutates while driving a strategy.
use crate::ScoutError;
use serde::Serialize;
use std::fmt;

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Every requested page was fetched
    PageLimitReached,

    /// The board ran out of results: empty page, disabled or missing next control
    EndOfResults,

    /// A verification wall or CAPTCHA blocked the run
    Interdicted,

    /// The fetching resource (browser, client) could not be initialized
    ResourceFailure,
}

impl Termination {
    /// Outcome label reported to users
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::PageLimitReached => "completed",
            Self::EndOfResults => "end-of-results",
            Self::Interdicted => "interdicted",
            Self::ResourceFailure => "resource-failure",
        }
    }

    /// Returns true if the run was stopped by a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Interdicted | Self::ResourceFailure)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.outcome())
    }
}

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Resources are being prepared; no page has been requested yet
    Start,

    /// The current page is being fetched and extracted
    FetchingPage,

    /// Records from the current page are being handed to the output stream
    EmittingRecords,

    // ===== Terminal States =====
    Terminated(Termination),
}

impl CrawlState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// | From | To |
    /// |------|----|
    /// | Start | FetchingPage, Terminated(*) |
    /// | FetchingPage | EmittingRecords, Terminated(*) |
    /// | EmittingRecords | FetchingPage, Terminated(*) |
    /// | Terminated | nothing |
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        match (self, next) {
            (Self::Terminated(_), _) => false,
            (_, Self::Terminated(_)) => true,
            (Self::Start, Self::FetchingPage) => true,
            (Self::FetchingPage, Self::EmittingRecords) => true,
            (Self::EmittingRecords, Self::FetchingPage) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchingPage => "fetching_page",
            Self::EmittingRecords => "emitting_records",
            Self::Terminated(Termination::PageLimitReached) => "terminated(page_limit_reached)",
            Self::Terminated(Termination::EndOfResults) => "terminated(end_of_results)",
            Self::Terminated(Termination::Interdicted) => "terminated(interdicted)",
            Self::Terminated(Termination::ResourceFailure) => "terminated(resource_failure)",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pagination progress of one crawl run
///
/// Owned and mutated only by the pagination controller. `current_page` starts
/// at 1 and never exceeds `target_page_count`.
#[derive(Debug, Clone)]
pub struct CrawlCursor {
    current_page: u32,
    target_page_count: u32,
    consecutive_empty_pages: u32,
    interdicted: bool,
    pages_fetched: u32,
    state: CrawlState,
}

impl CrawlCursor {
    /// Creates a cursor for `target_page_count` pages (at least one)
    pub fn new(target_page_count: u32) -> Self {
        Self {
            current_page: 1,
            target_page_count: target_page_count.max(1),
            consecutive_empty_pages: 0,
            interdicted: false,
            pages_fetched: 0,
            state: CrawlState::Start,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn target_page_count(&self) -> u32 {
        self.target_page_count
    }

    pub fn consecutive_empty_pages(&self) -> u32 {
        self.consecutive_empty_pages
    }

    pub fn interdicted(&self) -> bool {
        self.interdicted
    }

    /// Number of Start/EmittingRecords -> FetchingPage transitions so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Returns true once the cursor sits on the last requested page
    pub fn on_last_page(&self) -> bool {
        self.current_page >= self.target_page_count
    }

    /// Enters `FetchingPage` for the current page
    pub fn begin_page(&mut self) -> Result<(), ScoutError> {
        self.transition(CrawlState::FetchingPage)?;
        self.pages_fetched += 1;
        Ok(())
    }

    /// Records the yield of the fetched page
    ///
    /// A non-empty page moves to `EmittingRecords`; an empty one ends the run.
    pub fn page_yielded(&mut self, record_count: usize) -> Result<(), ScoutError> {
        if record_count == 0 {
            self.consecutive_empty_pages += 1;
            self.terminate(Termination::EndOfResults)
        } else {
            self.consecutive_empty_pages = 0;
            self.transition(CrawlState::EmittingRecords)
        }
    }

    /// Moves to the next page, or terminates if the page limit has been reached
    ///
    /// Returns true if there is another page to fetch.
    pub fn advance(&mut self) -> Result<bool, ScoutError> {
        if self.on_last_page() {
            self.terminate(Termination::PageLimitReached)?;
            return Ok(false);
        }
        self.current_page += 1;
        Ok(true)
    }

    /// Ends the run
    pub fn terminate(&mut self, termination: Termination) -> Result<(), ScoutError> {
        if termination == Termination::Interdicted {
            self.interdicted = true;
        }
        self.transition(CrawlState::Terminated(termination))
    }

    /// Returns how the run ended, if it has
    pub fn termination(&self) -> Option<Termination> {
        match self.state {
            CrawlState::Terminated(t) => Some(t),
            _ => None,
        }
    }

    fn transition(&mut self, to: CrawlState) -> Result<(), ScoutError> {
        if !self.state.can_transition_to(to) {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::trace!("Crawl state {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }
}
