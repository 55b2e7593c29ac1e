//! State module for tracking crawl progress
//!
//! This module provides the state machine a single crawl run moves through.
//!
//! # Components
//!
//! - `CrawlState`: Where the run currently is (start, fetching, emitting, terminated)
//! - `Termination`: How a terminated run ended
//! - `CrawlCursor`: Page counters owned by the pagination controller

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlCursor, CrawlState, Termination};
