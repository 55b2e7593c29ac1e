//! Chromium-based browser driver using chromiumoxide.

use crate::config::BrowserConfig;
use crate::crawler::driver::{BrowserError, BrowserLauncher, BrowserSession};
use crate::identity::Identity;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::fmt::Display;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Launch flags; chromiumoxide's defaults are disabled because they include `--enable-automation`
const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-sync",
    "--no-first-run",
    "--no-default-browser-check",
    "--no-sandbox",
    "--password-store=basic",
    "--lang=zh-CN",
    "--window-size=1920,1080",
];

/// Injected before any page script runs
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });
Object.defineProperty(navigator, 'languages', { get: () => ['zh-CN', 'zh', 'en'], configurable: true });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5], configurable: true });
if (!window.chrome) { window.chrome = {}; }
if (!window.chrome.runtime) { window.chrome.runtime = {}; }
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}
"#;

/// Find a Chrome/Chromium binary on PATH.
pub fn find_chromium() -> Option<PathBuf> {
    ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

fn protocol(err: impl Display) -> BrowserError {
    BrowserError::Protocol(err.to_string())
}

/// Launches one headless Chromium process per session
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
    headless: bool,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>, headless: bool) -> Self {
        Self {
            executable,
            headless,
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(config.executable.as_ref().map(PathBuf::from), config.headless)
    }

    fn resolve_executable(&self) -> Result<PathBuf, BrowserError> {
        match &self.executable {
            Some(path) => Ok(path.clone()),
            None => find_chromium().ok_or_else(|| {
                BrowserError::Launch("no Chrome/Chromium binary found on PATH".to_string())
            }),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, identity: &Identity) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let executable = self.resolve_executable()?;
        tracing::debug!("Launching browser {}", executable.display());

        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(executable)
            .disable_default_args()
            .args(LAUNCH_ARGS.iter().copied())
            .arg(format!("--user-agent={}", identity.user_agent));
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!("Failed to close browser after launch error: {}", close_err);
                }
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(BrowserError::Launch(format!("failed to open page: {}", e)));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
        }))
    }
}

/// A Chromium process with a single page
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn apply_stealth(&mut self, identity: &Identity) -> Result<(), BrowserError> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(protocol)?;

        let mut user_agent =
            SetUserAgentOverrideParams::builder().user_agent(identity.user_agent.clone());
        if let Some((_, language)) = identity
            .headers
            .iter()
            .find(|(name, _)| name == "accept-language")
        {
            user_agent = user_agent.accept_language(language.clone());
        }
        let user_agent = user_agent.build().map_err(protocol)?;
        self.page.execute(user_agent).await.map_err(protocol)?;
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url).await.map_err(protocol)?;
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool, BrowserError> {
        let elements = self.page.find_elements(selector).await.map_err(protocol)?;
        Ok(!elements.is_empty())
    }

    async fn title(&mut self) -> Result<String, BrowserError> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(protocol)?
            .unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(protocol)
    }

    async fn scroll_height(&mut self) -> Result<i64, BrowserError> {
        self.page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(protocol)?
            .into_value::<i64>()
            .map_err(protocol)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn class_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        let elements = self.page.find_elements(selector).await.map_err(protocol)?;
        match elements.first() {
            Some(element) => Ok(Some(
                element
                    .attribute("class")
                    .await
                    .map_err(protocol)?
                    .unwrap_or_default(),
            )),
            None => Ok(None),
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let elements = self.page.find_elements(selector).await.map_err(protocol)?;
        let element = elements
            .first()
            .ok_or_else(|| BrowserError::ElementMissing(selector.to_string()))?;
        element.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let closed = self.browser.close().await.map(|_| ()).map_err(protocol);
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to reap browser process: {}", e);
        }
        self.handler_task.abort();
        closed
    }
}
