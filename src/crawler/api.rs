//! Structured-API extraction strategy
//!
//! Secondary path for Lagou: the JSON endpoint its search page calls. Used
//! when the browser strategy comes back empty.

use crate::config::Config;
use crate::crawler::controller::{CrawlReport, PaginationController};
use crate::crawler::fetcher::{build_http_client, post_form, FetchResult};
use crate::crawler::strategy::{ExtractionStrategy, StrategyError};
use crate::identity::IdentityProvider;
use crate::pacing::Pacer;
use crate::record::{JobRecord, SourceName};
use crate::ScoutError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const POSITION_ENDPOINT: &str = "jobs/v2/positionAjax.json";

#[derive(Debug, Default, Deserialize)]
struct PositionResponse {
    #[serde(default)]
    content: Option<PositionContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionContent {
    #[serde(default)]
    position_result: Option<PositionResult>,
}

#[derive(Debug, Default, Deserialize)]
struct PositionResult {
    #[serde(default)]
    result: Vec<Position>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Position {
    position_name: Option<String>,
    company_short_name: Option<String>,
    industry_field: Option<String>,
    salary: Option<String>,
    position_advantage: Option<String>,
}

impl Position {
    fn into_record(self, source: SourceName) -> Option<JobRecord> {
        let title = self.position_name.unwrap_or_default();
        let company = self.company_short_name.unwrap_or_default();
        if title.trim().is_empty() && company.trim().is_empty() {
            return None;
        }

        let mut record = JobRecord::new(source, title, company);
        if let Some(industry) = self.industry_field {
            record = record.with_company_type(industry);
        }
        if let Some(salary) = self.salary {
            record = record.with_salary(salary);
        }
        if let Some(advantage) = self.position_advantage {
            record = record.with_skills(advantage);
        }
        Some(record)
    }
}

/// Form-POST strategy against Lagou's position endpoint
pub struct ApiStrategy {
    client: Client,
    identities: IdentityProvider,
    pacer: Pacer,
    base_url: Url,
}

impl ApiStrategy {
    pub fn lagou(
        config: &Config,
        identities: IdentityProvider,
        pacer: Pacer,
    ) -> Result<Self, ScoutError> {
        Self::new(
            &config.sources.lagou_api_base_url,
            Duration::from_secs(config.timeouts.request_secs),
            identities,
            pacer,
        )
    }

    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        identities: IdentityProvider,
        pacer: Pacer,
    ) -> Result<Self, ScoutError> {
        Ok(Self {
            client: build_http_client(request_timeout)?,
            identities,
            pacer,
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self) -> Result<Url, StrategyError> {
        self.base_url
            .join(POSITION_ENDPOINT)
            .map_err(|e| StrategyError::Page(format!("invalid endpoint: {}", e)))
    }

    fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    fn parse_positions(&self, body: &str) -> Result<Vec<JobRecord>, serde_json::Error> {
        let response: PositionResponse = serde_json::from_str(body)?;
        let positions = response
            .content
            .and_then(|c| c.position_result)
            .map(|r| r.result)
            .unwrap_or_default();

        let total = positions.len();
        let records: Vec<JobRecord> = positions
            .into_iter()
            .filter_map(|p| p.into_record(SourceName::LagouApi))
            .collect();

        if records.len() < total {
            tracing::warn!(
                "Skipped {} API positions without title or company",
                total - records.len()
            );
        }
        Ok(records)
    }

    /// Crawls up to `pages` API pages for `keyword`
    pub async fn crawl(self, keyword: &str, pages: u32) -> Result<CrawlReport, ScoutError> {
        PaginationController::new(self).run(keyword, pages).await
    }
}

#[async_trait]
impl ExtractionStrategy for ApiStrategy {
    fn source(&self) -> SourceName {
        SourceName::LagouApi
    }

    fn kind(&self) -> &'static str {
        "api"
    }

    async fn fetch_page(
        &mut self,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<JobRecord>, StrategyError> {
        let endpoint = self.endpoint()?;
        let origin = self.origin();
        let identity = self
            .identities
            .next_identity()
            .with_header(
                "content-type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .with_header("x-requested-with", "XMLHttpRequest")
            .with_header("origin", origin.clone())
            .with_header(
                "referer",
                format!("{}/jobs/list_{}", origin, urlencoding::encode(keyword)),
            );

        let form = [
            ("first", (page == 1).to_string()),
            ("pn", page.to_string()),
            ("kd", keyword.to_string()),
            ("sid", String::new()),
        ];

        tracing::info!("Requesting {} page {}: {}", SourceName::LagouApi, page, endpoint);
        let result = post_form(&self.client, endpoint.as_str(), &identity, &form).await;
        self.pacer.pace().await;

        match result {
            FetchResult::Success {
                body, status_code, ..
            } => match self.parse_positions(&body) {
                Ok(records) => {
                    tracing::debug!(
                        "{} page {} answered HTTP {} with {} positions",
                        SourceName::LagouApi,
                        page,
                        status_code,
                        records.len()
                    );
                    Ok(records)
                }
                Err(e) => {
                    tracing::error!("{} returned malformed JSON: {}", SourceName::LagouApi, e);
                    Ok(Vec::new())
                }
            },
            FetchResult::HttpError { status_code } => {
                tracing::error!(
                    "{} request failed with status {}",
                    SourceName::LagouApi,
                    status_code
                );
                Ok(Vec::new())
            }
            FetchResult::NetworkError { error, timed_out } => {
                if timed_out {
                    tracing::warn!("{} page {} timed out", SourceName::LagouApi, page);
                }
                Err(StrategyError::Page(error))
            }
        }
    }
}
