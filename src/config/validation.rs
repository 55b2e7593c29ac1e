use crate::config::types::{Config, IdentityConfig, PacingConfig, SourcesConfig, TimeoutsConfig};
use crate::extract::GlyphTables;
use crate::ConfigError;
use url::Url;

/// Upper bound on any single pacing delay
const MAX_PACING_DELAY_MS: u64 = 60_000;

/// Upper bound on scroll attempts per search page
const MAX_SCROLLS: u32 = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_pacing_config(&config.pacing)?;
    validate_timeouts_config(&config.timeouts)?;
    validate_identity_config(&config.identity)?;
    validate_sources_config(&config.sources)?;
    // Building the tables checks every glyph entry
    GlyphTables::from_config(config)?;
    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.max_delay_ms > MAX_PACING_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms must be <= {}ms, got {}ms",
            MAX_PACING_DELAY_MS, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates timeout configuration
fn validate_timeouts_config(config: &TimeoutsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("request-secs", config.request_secs),
        ("element-wait-secs", config.element_wait_secs),
        ("landmark-wait-secs", config.landmark_wait_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got 0",
                name
            )));
        }
    }

    if config.max_scrolls > MAX_SCROLLS {
        return Err(ConfigError::Validation(format!(
            "max-scrolls must be <= {}, got {}",
            MAX_SCROLLS, config.max_scrolls
        )));
    }

    Ok(())
}

/// Validates the identity pool
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if let Some(agents) = &config.user_agents {
        if agents.is_empty() {
            return Err(ConfigError::Validation(
                "user-agents cannot be empty when present".to_string(),
            ));
        }

        if agents.iter().any(|ua| ua.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "user-agents cannot contain blank entries".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates source endpoints
fn validate_sources_config(config: &SourcesConfig) -> Result<(), ConfigError> {
    validate_base_url("shixiseng-base-url", &config.shixiseng_base_url)?;
    validate_base_url("lagou-base-url", &config.lagou_base_url)?;
    validate_base_url("lagou-api-base-url", &config.lagou_api_base_url)?;
    Ok(())
}

/// Validates an HTTP(S) base URL
fn validate_base_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("{} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    // Relative joins replace a last segment that has no trailing slash
    if !url.path().ends_with('/') {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must end with '/'",
            name, value
        )));
    }

    Ok(())
}
