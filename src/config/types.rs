use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for Intern-Scout
///
/// Every section is optional; an empty file yields `Config::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pacing: PacingConfig,
    pub timeouts: TimeoutsConfig,
    pub browser: BrowserConfig,
    pub identity: IdentityConfig,
    pub sources: SourcesConfig,
    /// Glyph substitution tables keyed by source name
    pub glyphs: HashMap<String, HashMap<String, String>>,
}

/// Randomized delay between outbound actions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Lower bound of the delay (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 200,
        }
    }
}

/// Bounds on every network wait
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// HTTP request timeout (seconds)
    #[serde(rename = "request-secs")]
    pub request_secs: u64,

    /// Wait for listing cards to appear (seconds)
    #[serde(rename = "element-wait-secs")]
    pub element_wait_secs: u64,

    /// Wait for the home page landmark (seconds)
    #[serde(rename = "landmark-wait-secs")]
    pub landmark_wait_secs: u64,

    /// Settle delay after clicking "next page" (milliseconds)
    #[serde(rename = "page-turn-settle-ms")]
    pub page_turn_settle_ms: u64,

    /// Settle delay after each scroll to bottom (milliseconds)
    #[serde(rename = "scroll-settle-ms")]
    pub scroll_settle_ms: u64,

    /// Maximum scroll-to-bottom attempts for lazy-loaded content
    #[serde(rename = "max-scrolls")]
    pub max_scrolls: u32,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            element_wait_secs: 10,
            landmark_wait_secs: 15,
            page_turn_settle_ms: 2000,
            scroll_settle_ms: 2000,
            max_scrolls: 3,
        }
    }
}

/// Headless browser launch settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to a Chrome/Chromium binary; discovered on PATH when absent
    pub executable: Option<String>,

    /// Run without a visible window
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
        }
    }
}

/// Client identity pool
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Replaces the built-in user agent pool
    #[serde(rename = "user-agents")]
    pub user_agents: Option<Vec<String>>,
}

/// Endpoints of the supported boards
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    #[serde(rename = "shixiseng-base-url")]
    pub shixiseng_base_url: String,

    #[serde(rename = "lagou-base-url")]
    pub lagou_base_url: String,

    #[serde(rename = "lagou-api-base-url")]
    pub lagou_api_base_url: String,

    /// Try the structured API when the browser run yields nothing
    #[serde(rename = "lagou-api-fallback")]
    pub lagou_api_fallback: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            shixiseng_base_url: "https://www.shixiseng.com/".to_string(),
            lagou_base_url: "https://www.lagou.com/".to_string(),
            lagou_api_base_url: "https://www.lagou.com/".to_string(),
            lagou_api_fallback: true,
        }
    }
}
