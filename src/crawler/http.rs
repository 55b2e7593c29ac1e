//! HTTP extraction strategy
//!
//! Plain GET requests against a board that serves its listings as static
//! markup: one listing request per page, then one detail request per listing.
//! Failures are soft; a failed listing request reads as an empty page.

use crate::config::Config;
use crate::crawler::controller::{CrawlReport, PaginationController};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::strategy::{ExtractionStrategy, StrategyError};
use crate::extract::{parse_selector, CardOutcome, CompiledRules, GlyphTable, HttpSiteProfile};
use crate::identity::IdentityProvider;
use crate::pacing::Pacer;
use crate::record::{JobRecord, SourceName};
use crate::ScoutError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Listing-page plus detail-page strategy over plain HTTP
pub struct HttpStrategy {
    source: SourceName,
    client: Client,
    identities: IdentityProvider,
    pacer: Pacer,
    glyphs: Arc<GlyphTable>,
    base_url: Url,
    profile: HttpSiteProfile,
    listing_item: Selector,
    detail_link: Selector,
    detail_rules: CompiledRules,
}

impl HttpStrategy {
    /// Creates the Shixiseng strategy from configuration
    pub fn shixiseng(
        config: &Config,
        identities: IdentityProvider,
        pacer: Pacer,
        glyphs: Arc<GlyphTable>,
    ) -> Result<Self, ScoutError> {
        Self::new(
            SourceName::Shixiseng,
            &config.sources.shixiseng_base_url,
            HttpSiteProfile::shixiseng(),
            Duration::from_secs(config.timeouts.request_secs),
            identities,
            pacer,
            glyphs,
        )
    }

    pub fn new(
        source: SourceName,
        base_url: &str,
        profile: HttpSiteProfile,
        request_timeout: Duration,
        identities: IdentityProvider,
        pacer: Pacer,
        glyphs: Arc<GlyphTable>,
    ) -> Result<Self, ScoutError> {
        Ok(Self {
            source,
            client: build_http_client(request_timeout)?,
            identities,
            pacer,
            glyphs,
            base_url: Url::parse(base_url)?,
            listing_item: parse_selector(&profile.listing_item)?,
            detail_link: parse_selector(&profile.detail_link)?,
            detail_rules: CompiledRules::compile(&profile.detail_rules)?,
            profile,
        })
    }

    /// Search listing URL for `keyword` and 1-based `page`
    pub fn listing_url(&self, keyword: &str, page: u32) -> Result<Url, ScoutError> {
        let mut url = self.base_url.join(&self.profile.listing_path)?;
        url.set_query(Some(&format!(
            "keyword={}&page={}",
            urlencoding::encode(keyword),
            page
        )));
        Ok(url)
    }

    /// Returns the detail URLs listed on `page`
    ///
    /// Never fails: a non-200 status or network error is logged and reads as an
    /// empty list, which callers cannot tell apart from a genuinely empty page.
    pub async fn list_page(&self, keyword: &str, page: u32) -> Vec<String> {
        let links = match self.listing_url(keyword, page) {
            Ok(url) => {
                tracing::info!("Fetching {} listing page {}: {}", self.source, page, url);
                let identity = self.identities.next_identity();
                match fetch_url(&self.client, url.as_str(), &identity).await {
                    FetchResult::Success {
                        body,
                        final_url,
                        status_code,
                    } => {
                        tracing::debug!(
                            "{} listing page {} answered HTTP {} from {}",
                            self.source,
                            page,
                            status_code,
                            final_url
                        );
                        let base = Url::parse(&final_url).unwrap_or(url);
                        self.parse_listing(&body, &base)
                    }
                    failure if failure.is_timeout() => {
                        tracing::warn!(
                            "{} listing page {} timed out, treating it as empty",
                            self.source,
                            page
                        );
                        Vec::new()
                    }
                    failure => {
                        tracing::error!(
                            "{} listing page {} request failed: {}",
                            self.source,
                            page,
                            failure.describe_failure().unwrap_or_default()
                        );
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                tracing::error!("Cannot build {} listing URL: {}", self.source, e);
                Vec::new()
            }
        };

        self.pacer.pace().await;
        links
    }

    /// Fetches and extracts one detail page
    ///
    /// Returns `None` on a failed request or when neither title nor company is present.
    pub async fn fetch_detail(&self, url: &str) -> Option<JobRecord> {
        tracing::debug!("Fetching {} detail page: {}", self.source, url);
        let identity = self.identities.next_identity();

        let record = match fetch_url(&self.client, url, &identity).await {
            FetchResult::Success { body, .. } => self.parse_detail(&body, url),
            failure if failure.is_timeout() => {
                tracing::warn!("{} detail request timed out: {}", self.source, url);
                None
            }
            failure => {
                tracing::error!(
                    "{} detail request failed: {}: {}",
                    self.source,
                    url,
                    failure.describe_failure().unwrap_or_default()
                );
                None
            }
        };

        self.pacer.pace().await;
        record
    }

    fn parse_listing(&self, body: &str, base: &Url) -> Vec<String> {
        let document = Html::parse_document(body);

        document
            .select(&self.listing_item)
            .filter_map(|item| item.select(&self.detail_link).next())
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| match base.join(href) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    tracing::debug!("Skipping unresolvable detail link {}: {}", href, e);
                    None
                }
            })
            .collect()
    }

    fn parse_detail(&self, body: &str, url: &str) -> Option<JobRecord> {
        let document = Html::parse_document(body);
        let fields = self
            .detail_rules
            .extract(document.root_element(), &self.glyphs);

        let missing = fields.missing();
        if !missing.is_empty() {
            tracing::warn!(
                "{} detail {} missing fields: {:?}",
                self.source,
                url,
                missing.iter().map(|f| f.as_str()).collect::<Vec<_>>()
            );
        }

        match fields.into_outcome(self.source, Some(url)) {
            CardOutcome::Record(record) => Some(record),
            CardOutcome::Dropped => {
                tracing::warn!(
                    "{} detail {} has neither title nor company, skipping",
                    self.source,
                    url
                );
                None
            }
        }
    }

    /// Crawls up to `pages` listing pages for `keyword`
    pub async fn crawl(self, keyword: &str, pages: u32) -> Result<CrawlReport, ScoutError> {
        PaginationController::new(self).run(keyword, pages).await
    }
}

#[async_trait]
impl ExtractionStrategy for HttpStrategy {
    fn source(&self) -> SourceName {
        self.source
    }

    fn kind(&self) -> &'static str {
        "http"
    }

    async fn fetch_page(
        &mut self,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<JobRecord>, StrategyError> {
        let links = self.list_page(keyword, page).await;
        tracing::info!(
            "{} listing page {} has {} detail links",
            self.source,
            page,
            links.len()
        );

        let mut records = Vec::with_capacity(links.len());
        for link in &links {
            if let Some(record) = self.fetch_detail(link).await {
                tracing::info!("Extracted: {} - {}", record.title(), record.company());
                records.push(record);
            }
        }

        Ok(records)
    }
}
