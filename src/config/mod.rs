//! Configuration module for Intern-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Configuration is read once at startup and shared read-only afterwards.
//!
//! # Example
//!
//! ```no_run
//! use intern_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Pacing up to {}ms", config.pacing.max_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, IdentityConfig, PacingConfig, SourcesConfig, TimeoutsConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
