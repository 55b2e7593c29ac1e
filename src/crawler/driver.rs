//! Browser driver seam
//!
//! The browser strategy talks to a headless browser only through
//! `BrowserLauncher` and `BrowserSession`. Production uses Chromium over CDP;
//! tests substitute scripted sessions.

use crate::identity::Identity;
use crate::pacing::{with_timeout, TimeoutError};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Interval between element presence checks while waiting
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser driver errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("element not found: {0}")]
    ElementMissing(String),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("browser session already released")]
    Released,
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launches a fresh browser presenting `identity`
    async fn launch(&self, identity: &Identity) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// A single live browser with one page
#[async_trait]
pub trait BrowserSession: Send {
    /// Installs anti-fingerprinting overrides; must run before the first navigation
    async fn apply_stealth(&mut self, identity: &Identity) -> Result<(), BrowserError>;

    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Returns true if at least one element matches `selector`
    async fn has_element(&mut self, selector: &str) -> Result<bool, BrowserError>;

    async fn title(&mut self) -> Result<String, BrowserError>;

    /// Serialized DOM of the current page
    async fn content(&mut self) -> Result<String, BrowserError>;

    async fn scroll_height(&mut self) -> Result<i64, BrowserError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    /// Class attribute of the first match, `None` if nothing matches
    async fn class_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError>;

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Shuts the browser down and releases its process
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Waits until `selector` matches, polling every `ELEMENT_POLL_INTERVAL`
///
/// Protocol errors during polling are retried until the timeout; the page may
/// still be navigating.
pub async fn wait_for_element(
    session: &mut dyn BrowserSession,
    selector: &str,
    timeout: Duration,
) -> Result<(), BrowserError> {
    with_timeout(&format!("waiting for {}", selector), timeout, async {
        loop {
            match session.has_element(selector).await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => tracing::debug!("Presence check for {} failed: {}", selector, e),
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    })
    .await?;
    Ok(())
}

/// Scoped ownership of a browser session
///
/// Provides two cleanup paths:
/// 1. Explicit async `close()` - used on every normal return path
/// 2. Drop fallback - spawns a background close if the guard is dropped unclosed
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// The live session, or `BrowserError::Released` after close
    pub fn session(&mut self) -> Result<&mut (dyn BrowserSession + 'static), BrowserError> {
        self.session.as_deref_mut().ok_or(BrowserError::Released)
    }

    /// Closes the session, consuming the guard
    pub async fn close(mut self) -> Result<(), BrowserError> {
        match self.session.take() {
            Some(mut session) => {
                let result = session.close().await;
                if result.is_ok() {
                    tracing::debug!("Browser session closed");
                }
                result
            }
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    tracing::warn!("Browser session dropped without close, closing in background");
                    handle.spawn(async move {
                        if let Err(e) = session.close().await {
                            tracing::error!("Background browser cleanup failed: {}", e);
                        }
                    });
                }
                Err(_) => {
                    tracing::error!("Browser session dropped outside a runtime, process may leak");
                }
            }
        }
    }
}
