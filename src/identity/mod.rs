//! Request identity provider
//!
//! Every outbound request (and every browser launch) draws a fresh client
//! identity from a fixed pool of realistic desktop profiles. Nothing is
//! remembered between draws; a caller that needs a stable identity for a whole
//! session keeps the `Identity` it was given.

use crate::config::IdentityConfig;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::sync::Arc;

/// Desktop user agents used when the configuration does not supply a pool
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
];

/// Navigation headers a desktop browser sends alongside its user agent
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("cache-control", "max-age=0"),
    ("referer", "https://www.google.com/"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "cross-site"),
    ("sec-fetch-user", "?1"),
    ("pragma", "no-cache"),
];

/// A client identity: user agent plus the header set that goes with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
}

impl Identity {
    /// Returns a copy with an extra header, replacing any header of the same name
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(existing, _)| *existing != name);
        self.headers.push((name, value.into()));
        self
    }

    /// Builds the request headers, user agent included
    ///
    /// Headers that are not valid HTTP header names or values are skipped.
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len() + 1);

        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            map.insert(USER_AGENT, value);
        }

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid header {}: {}", name, value),
            }
        }

        map
    }
}

/// Draws random identities from a fixed, read-only pool
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    user_agents: Arc<Vec<String>>,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect())
    }
}

impl IdentityProvider {
    /// Creates a provider over the given user agents
    ///
    /// An empty pool falls back to the built-in agents.
    pub fn new(user_agents: Vec<String>) -> Self {
        if user_agents.is_empty() {
            return Self::default();
        }
        Self {
            user_agents: Arc::new(user_agents),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        match &config.user_agents {
            Some(agents) => Self::new(agents.clone()),
            None => Self::default(),
        }
    }

    /// Returns a uniformly random identity from the pool
    pub fn next_identity(&self) -> Identity {
        let user_agent = self
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string());

        Identity {
            user_agent,
            headers: BROWSER_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.user_agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_drawn_from_pool() {
        let provider = IdentityProvider::default();
        for _ in 0..50 {
            let identity = provider.next_identity();
            assert!(DEFAULT_USER_AGENTS.contains(&identity.user_agent.as_str()));
        }
    }

    #[test]
    fn test_custom_pool() {
        let provider = IdentityProvider::new(vec!["TestAgent/1.0".to_string()]);
        assert_eq!(provider.pool_size(), 1);
        assert_eq!(provider.next_identity().user_agent, "TestAgent/1.0");
    }

    #[test]
    fn test_empty_pool_uses_defaults() {
        let provider = IdentityProvider::new(Vec::new());
        assert_eq!(provider.pool_size(), DEFAULT_USER_AGENTS.len());
    }

    #[test]
    fn test_header_map_contains_user_agent_and_navigation_headers() {
        let identity = IdentityProvider::new(vec!["TestAgent/1.0".to_string()]).next_identity();
        let headers = identity.header_map();

        assert_eq!(headers.get(USER_AGENT).unwrap(), "TestAgent/1.0");
        assert_eq!(
            headers.get("accept-language").unwrap(),
            "zh-CN,zh;q=0.9,en;q=0.8"
        );
        assert_eq!(headers.len(), BROWSER_HEADERS.len() + 1);
    }

    #[test]
    fn test_with_header_replaces_existing() {
        let identity = IdentityProvider::default()
            .next_identity()
            .with_header("Referer", "https://www.lagou.com/jobs/list_Java");

        let headers = identity.header_map();
        assert_eq!(
            headers.get("referer").unwrap(),
            "https://www.lagou.com/jobs/list_Java"
        );
        assert_eq!(headers.get_all("referer").iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let identity = Identity {
            user_agent: "TestAgent/1.0".to_string(),
            headers: vec![("bad header".to_string(), "x".to_string())],
        };
        assert_eq!(identity.header_map().len(), 1);
    }
}
