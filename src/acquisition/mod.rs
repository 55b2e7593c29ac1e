//! Acquisition facade
//!
//! Binds each source to its extraction strategy, drives it through the
//! pagination controller, and applies the per-source fallback policy:
//!
//! | Source | Primary | Fallback |
//! |--------|---------|----------|
//! | Shixiseng | HTTP | none |
//! | Lagou | browser | structured API, if enabled and the browser run yielded nothing |
//! | LagouApi | structured API | none |
//!
//! The fallback decision is made once per run; nothing is retried in a loop.

use crate::config::Config;
use crate::crawler::{
    ApiStrategy, BrowserLauncher, BrowserStrategy, ChromiumLauncher, CrawlReport, HttpStrategy,
};
use crate::extract::GlyphTables;
use crate::identity::IdentityProvider;
use crate::pacing::Pacer;
use crate::record::{JobRecord, SourceName};
use crate::state::Termination;
use crate::ScoutError;
use std::sync::Arc;

/// Result of one `acquire` call
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    /// The source the caller asked for
    pub requested: SourceName,
    /// The run whose records are delivered
    pub delivered: CrawlReport,
    /// The primary run, when a fallback replaced it
    pub primary: Option<CrawlReport>,
    /// The fallback run, when it was attempted but came back empty
    pub discarded_fallback: Option<CrawlReport>,
    pub fallback_attempted: bool,
}

impl AcquisitionReport {
    fn direct(requested: SourceName, delivered: CrawlReport) -> Self {
        Self {
            requested,
            delivered,
            primary: None,
            discarded_fallback: None,
            fallback_attempted: false,
        }
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.delivered.records
    }

    pub fn into_records(self) -> Vec<JobRecord> {
        self.delivered.records
    }

    /// How the delivered run ended
    pub fn termination(&self) -> Termination {
        self.delivered.termination
    }

    /// Returns true if the delivered records came from the fallback path
    pub fn fallback_used(&self) -> bool {
        self.primary.is_some()
    }

    /// Wall time of every run made for this request, fallback included
    pub fn total_duration(&self) -> chrono::Duration {
        [Some(&self.delivered), self.primary.as_ref(), self.discarded_fallback.as_ref()]
            .into_iter()
            .flatten()
            .fold(chrono::Duration::zero(), |total, run| total + run.duration())
    }
}

/// Entry point for listing acquisition
///
/// Holds only read-only state; every `acquire` call builds fresh strategy
/// instances (own HTTP client, own browser), so concurrent calls share nothing
/// mutable.
pub struct Acquisition {
    config: Arc<Config>,
    identities: IdentityProvider,
    glyphs: GlyphTables,
    pacer: Pacer,
    launcher: Arc<dyn BrowserLauncher>,
}

impl Acquisition {
    /// Creates a facade that launches Chromium for browser-driven sources
    pub fn new(config: Config) -> Result<Self, ScoutError> {
        let launcher = Arc::new(ChromiumLauncher::from_config(&config.browser));
        Self::with_launcher(config, launcher)
    }

    /// Creates a facade with a custom browser launcher
    pub fn with_launcher(
        config: Config,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Result<Self, ScoutError> {
        let glyphs = GlyphTables::from_config(&config)?;
        Ok(Self {
            identities: IdentityProvider::from_config(&config.identity),
            pacer: Pacer::from_config(&config.pacing),
            glyphs,
            launcher,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Acquires up to `page_count` pages of listings for `keyword` from `source`
    ///
    /// Only an invalid page count or a broken strategy setup is an error.
    /// Interdiction and resource failures are reported in the returned report,
    /// alongside whatever records were collected first.
    pub async fn acquire(
        &self,
        keyword: &str,
        source: SourceName,
        page_count: u32,
    ) -> Result<AcquisitionReport, ScoutError> {
        if page_count == 0 {
            return Err(ScoutError::InvalidPageCount);
        }

        match source {
            SourceName::Shixiseng => {
                let report = self.http_strategy()?.crawl(keyword, page_count).await?;
                Ok(AcquisitionReport::direct(source, report))
            }
            SourceName::LagouApi => {
                let report = self.api_strategy()?.crawl(keyword, page_count).await?;
                Ok(AcquisitionReport::direct(source, report))
            }
            SourceName::Lagou => {
                let primary = self.browser_strategy()?.crawl(keyword, page_count).await?;

                if !primary.records.is_empty() || !self.config.sources.lagou_api_fallback {
                    return Ok(AcquisitionReport::direct(source, primary));
                }

                tracing::warn!(
                    "{} browser run yielded no records ({}), trying {}",
                    source,
                    primary.termination,
                    SourceName::LagouApi
                );
                let fallback = self.api_strategy()?.crawl(keyword, page_count).await?;

                if fallback.records.is_empty() {
                    tracing::warn!("{} fallback yielded no records either", SourceName::LagouApi);
                    return Ok(AcquisitionReport {
                        requested: source,
                        delivered: primary,
                        primary: None,
                        discarded_fallback: Some(fallback),
                        fallback_attempted: true,
                    });
                }

                tracing::info!(
                    "{} fallback delivered {} records",
                    SourceName::LagouApi,
                    fallback.records.len()
                );
                Ok(AcquisitionReport {
                    requested: source,
                    delivered: fallback,
                    primary: Some(primary),
                    discarded_fallback: None,
                    fallback_attempted: true,
                })
            }
        }
    }

    fn http_strategy(&self) -> Result<HttpStrategy, ScoutError> {
        HttpStrategy::shixiseng(
            &self.config,
            self.identities.clone(),
            self.pacer,
            self.glyphs.for_source(SourceName::Shixiseng),
        )
    }

    fn browser_strategy(&self) -> Result<BrowserStrategy, ScoutError> {
        Ok(BrowserStrategy::lagou(
            &self.config,
            Arc::clone(&self.launcher),
            self.identities.clone(),
            self.pacer,
        )?
        .with_glyphs(self.glyphs.for_source(SourceName::Lagou)))
    }

    fn api_strategy(&self) -> Result<ApiStrategy, ScoutError> {
        ApiStrategy::lagou(&self.config, self.identities.clone(), self.pacer)
    }
}
