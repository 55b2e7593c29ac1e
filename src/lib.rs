//! Intern-Scout: resilient internship listing acquisition
//!
//! This crate discovers, fetches and extracts internship job records from job boards
//! that resist automated collection (fingerprint checks, verification walls and
//! glyph-substituted numbers), and hands a clean record list to downstream consumers.

pub mod acquisition;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod identity;
pub mod output;
pub mod pacing;
pub mod record;
pub mod state;

use thiserror::Error;

/// Main error type for Intern-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Page count must be greater than zero")]
    InvalidPageCount,

    #[error("Invalid crawl state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid glyph mapping: {0}")]
    InvalidGlyph(String),
}

/// Result type alias for Intern-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use acquisition::{Acquisition, AcquisitionReport};
pub use config::Config;
pub use record::{JobRecord, SourceName};
pub use state::{CrawlState, Termination};
