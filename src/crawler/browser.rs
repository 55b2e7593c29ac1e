//! Browser-automation extraction strategy
//!
//! Drives a headless browser through a board that renders its listings with
//! script and guards them with fingerprint checks:
//!
//! 1. Launch with stealth overrides and a drawn identity
//! 2. Load the home page and wait for its landmark (proves this is not a block page)
//! 3. Load the keyword search page and wait for the first card
//! 4. Scroll to the bottom until the page height settles
//! 5. Per page: wait for cards, extract them from the DOM snapshot, click "next"
//!
//! The session is owned by a `SessionGuard` from launch onwards and released in
//! `close`, which the pagination controller calls on every exit path.

use crate::config::{Config, TimeoutsConfig};
use crate::crawler::controller::{CrawlReport, PaginationController};
use crate::crawler::driver::{wait_for_element, BrowserLauncher, BrowserSession, SessionGuard};
use crate::crawler::strategy::{ExtractionStrategy, NextPage, StrategyError};
use crate::extract::{parse_selector, BrowserSiteProfile, CardOutcome, CompiledRules, GlyphTable};
use crate::identity::IdentityProvider;
use crate::pacing::Pacer;
use crate::record::{JobRecord, SourceName};
use crate::ScoutError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Waits and settle delays used while driving the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserTimings {
    pub landmark_wait: Duration,
    pub element_wait: Duration,
    pub page_turn_settle: Duration,
    pub scroll_settle: Duration,
    pub max_scrolls: u32,
}

impl Default for BrowserTimings {
    fn default() -> Self {
        Self::from_config(&TimeoutsConfig::default())
    }
}

impl BrowserTimings {
    pub fn from_config(config: &TimeoutsConfig) -> Self {
        Self {
            landmark_wait: Duration::from_secs(config.landmark_wait_secs),
            element_wait: Duration::from_secs(config.element_wait_secs),
            page_turn_settle: Duration::from_millis(config.page_turn_settle_ms),
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
            max_scrolls: config.max_scrolls,
        }
    }
}

/// Rendered-DOM strategy over a `BrowserLauncher`
pub struct BrowserStrategy {
    source: SourceName,
    launcher: Arc<dyn BrowserLauncher>,
    identities: IdentityProvider,
    pacer: Pacer,
    timings: BrowserTimings,
    glyphs: Arc<GlyphTable>,
    base_url: Url,
    profile: BrowserSiteProfile,
    card: Selector,
    card_rules: CompiledRules,
    session: Option<SessionGuard>,
}

impl BrowserStrategy {
    /// Creates the Lagou strategy from configuration
    pub fn lagou(
        config: &Config,
        launcher: Arc<dyn BrowserLauncher>,
        identities: IdentityProvider,
        pacer: Pacer,
    ) -> Result<Self, ScoutError> {
        Self::new(
            SourceName::Lagou,
            &config.sources.lagou_base_url,
            BrowserSiteProfile::lagou(),
            BrowserTimings::from_config(&config.timeouts),
            launcher,
            identities,
            pacer,
        )
    }

    pub fn new(
        source: SourceName,
        base_url: &str,
        profile: BrowserSiteProfile,
        timings: BrowserTimings,
        launcher: Arc<dyn BrowserLauncher>,
        identities: IdentityProvider,
        pacer: Pacer,
    ) -> Result<Self, ScoutError> {
        Ok(Self {
            source,
            launcher,
            identities,
            pacer,
            timings,
            glyphs: Arc::new(GlyphTable::default()),
            base_url: Url::parse(base_url)?,
            card: parse_selector(&profile.card)?,
            card_rules: CompiledRules::compile(&profile.card_rules)?,
            profile,
            session: None,
        })
    }

    /// Decodes glyph-substituted fields with `glyphs`
    pub fn with_glyphs(mut self, glyphs: Arc<GlyphTable>) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Keyword search URL
    pub fn search_url(&self, keyword: &str) -> Result<Url, ScoutError> {
        let mut url = self.base_url.join(&self.profile.search_path)?;
        url.set_query(Some(&format!(
            "{}={}",
            self.profile.keyword_param,
            urlencoding::encode(keyword)
        )));
        Ok(url)
    }

    /// Extracts every non-advertisement card from a DOM snapshot
    ///
    /// A missing field falls back to its sentinel; a card is skipped only when
    /// both title and company are missing.
    pub fn extract_cards(&self, html: &str, page: u32) -> Vec<JobRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut dropped = 0;

        for (index, card) in document.select(&self.card).enumerate() {
            let fields = self.card_rules.extract(card, &self.glyphs);

            let missing = fields.missing();
            if !missing.is_empty() {
                tracing::warn!(
                    "{} page {} card {}: missing {:?}",
                    self.source,
                    page,
                    index + 1,
                    missing.iter().map(|f| f.as_str()).collect::<Vec<_>>()
                );
            }

            match fields.into_outcome(self.source, None) {
                CardOutcome::Record(record) => records.push(record),
                CardOutcome::Dropped => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::warn!(
                "{} page {}: skipped {} cards with neither title nor company",
                self.source,
                page,
                dropped
            );
        }

        records
    }

    /// Crawls up to `pages` result pages for `keyword`
    pub async fn crawl(self, keyword: &str, pages: u32) -> Result<CrawlReport, ScoutError> {
        PaginationController::new(self).run(keyword, pages).await
    }

    async fn prepare(&mut self, keyword: &str) -> Result<(), StrategyError> {
        let search_url = self
            .search_url(keyword)
            .map_err(|e| StrategyError::Page(format!("invalid search URL: {}", e)))?;
        let identity = self.identities.next_identity();
        tracing::info!("Launching browser for {}", self.source);

        let session = self
            .launcher
            .launch(&identity)
            .await
            .map_err(|e| StrategyError::ResourceInit(e.to_string()))?;
        let session = self
            .session
            .insert(SessionGuard::new(session))
            .session()
            .map_err(|e| StrategyError::ResourceInit(e.to_string()))?;

        session
            .apply_stealth(&identity)
            .await
            .map_err(|e| StrategyError::ResourceInit(format!("stealth setup failed: {}", e)))?;

        let home = self.base_url.as_str();
        tracing::info!("Opening {} home page {}", self.source, home);
        session
            .goto(home)
            .await
            .map_err(|e| StrategyError::Page(format!("home page navigation failed: {}", e)))?;

        let landmark = &self.profile.home_landmark;
        if let Err(e) = wait_for_element(session, landmark, self.timings.landmark_wait).await {
            if let Some(signal) = interdiction_signal(session, &self.profile).await {
                return Err(StrategyError::Interdicted { signal });
            }
            return Err(StrategyError::Page(format!(
                "home page landmark {} missing: {}",
                landmark, e
            )));
        }
        self.pacer.pace().await;

        tracing::info!("Opening {} search page {}", self.source, search_url);
        session
            .goto(search_url.as_str())
            .await
            .map_err(|e| StrategyError::Page(format!("search navigation failed: {}", e)))?;

        let cards = &self.profile.card_presence;
        if let Err(e) = wait_for_element(session, cards, self.timings.element_wait).await {
            if let Some(signal) = interdiction_signal(session, &self.profile).await {
                return Err(StrategyError::Interdicted { signal });
            }
            tracing::warn!("No listing cards on {} search page yet: {}", self.source, e);
        }

        settle_lazy_content(session, &self.timings).await;
        Ok(())
    }
}

fn live_session(
    slot: &mut Option<SessionGuard>,
) -> Result<&mut (dyn BrowserSession + 'static), StrategyError> {
    match slot.as_mut() {
        Some(guard) => guard
            .session()
            .map_err(|e| StrategyError::Page(e.to_string())),
        None => Err(StrategyError::Page("browser session not open".to_string())),
    }
}

/// Returns the page title if it carries an interdiction marker
async fn interdiction_signal(
    session: &mut dyn BrowserSession,
    profile: &BrowserSiteProfile,
) -> Option<String> {
    match session.title().await {
        Ok(title) => profile.interdiction_marker(&title).map(|_| title.clone()),
        Err(e) => {
            tracing::debug!("Could not read page title: {}", e);
            None
        }
    }
}

/// Scrolls to the bottom until the page height stops growing
async fn settle_lazy_content(session: &mut dyn BrowserSession, timings: &BrowserTimings) {
    let mut last_height = match session.scroll_height().await {
        Ok(height) => height,
        Err(e) => {
            tracing::debug!("Skipping lazy-load scrolling: {}", e);
            return;
        }
    };

    for attempt in 1..=timings.max_scrolls {
        if let Err(e) = session.scroll_to_bottom().await {
            tracing::debug!("Scroll attempt {} failed: {}", attempt, e);
            return;
        }
        tokio::time::sleep(timings.scroll_settle).await;

        match session.scroll_height().await {
            Ok(height) if height == last_height => {
                tracing::debug!("Page height settled after {} scrolls", attempt);
                return;
            }
            Ok(height) => last_height = height,
            Err(e) => {
                tracing::debug!("Could not read page height: {}", e);
                return;
            }
        }
    }
}

#[async_trait]
impl ExtractionStrategy for BrowserStrategy {
    fn source(&self) -> SourceName {
        self.source
    }

    fn kind(&self) -> &'static str {
        "browser"
    }

    async fn open(&mut self, keyword: &str) -> Result<(), StrategyError> {
        self.prepare(keyword).await
    }

    async fn fetch_page(
        &mut self,
        _keyword: &str,
        page: u32,
    ) -> Result<Vec<JobRecord>, StrategyError> {
        let session = live_session(&mut self.session)?;

        let cards = &self.profile.card_presence;
        if let Err(e) = wait_for_element(session, cards, self.timings.element_wait).await {
            if let Some(signal) = interdiction_signal(session, &self.profile).await {
                return Err(StrategyError::Interdicted { signal });
            }
            return Err(StrategyError::Page(format!(
                "no listing cards on page {}: {}",
                page, e
            )));
        }
        self.pacer.pace().await;

        let html = session
            .content()
            .await
            .map_err(|e| StrategyError::Page(format!("reading page {} failed: {}", page, e)))?;

        Ok(self.extract_cards(&html, page))
    }

    async fn advance(&mut self) -> Result<NextPage, StrategyError> {
        let session = live_session(&mut self.session)?;
        let next = &self.profile.next_control;

        let classes = session
            .class_of(next)
            .await
            .map_err(|e| StrategyError::Page(format!("reading next control failed: {}", e)))?;

        match classes {
            None => {
                tracing::warn!("Next page control {} not found, stopping", next);
                return Ok(NextPage::Exhausted);
            }
            Some(classes)
                if classes
                    .split_whitespace()
                    .any(|class| class == self.profile.disabled_class) =>
            {
                tracing::info!("Next page control disabled, last page reached");
                return Ok(NextPage::Exhausted);
            }
            Some(_) => {}
        }

        session
            .click(next)
            .await
            .map_err(|e| StrategyError::Page(format!("clicking next page failed: {}", e)))?;
        tokio::time::sleep(self.timings.page_turn_settle).await;
        Ok(NextPage::Available)
    }

    async fn close(&mut self) {
        if let Some(guard) = self.session.take() {
            match guard.close().await {
                Ok(()) => tracing::info!("Released browser for {}", self.source),
                Err(e) => tracing::error!("Failed to release browser for {}: {}", self.source, e),
            }
        }
    }
}
