//! Crawler module for listing acquisition
//!
//! This module contains the core crawling logic, including:
//! - The extraction strategy seam and its three implementations (HTTP, browser, API)
//! - HTTP fetching with per-request identities
//! - The browser driver seam and its Chromium implementation
//! - Pagination control over a bounded page range

mod api;
mod browser;
mod chromium;
mod controller;
mod driver;
mod fetcher;
mod http;
mod strategy;

pub use api::ApiStrategy;
pub use browser::{BrowserStrategy, BrowserTimings};
pub use chromium::{find_chromium, ChromiumLauncher, ChromiumSession};
pub use controller::{CrawlReport, PaginationController};
pub use driver::{wait_for_element, BrowserError, BrowserLauncher, BrowserSession, SessionGuard};
pub use fetcher::{build_http_client, fetch_url, post_form, FetchResult};
pub use http::HttpStrategy;
pub use strategy::{ExtractionStrategy, NextPage, StrategyError};
