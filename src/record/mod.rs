//! Canonical job record produced by the acquisition pipeline
//!
//! A `JobRecord` is built once per listing by an extraction strategy and is never
//! modified after it has been handed to the crawl controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel used when a listing has no extractable title
pub const UNKNOWN_TITLE: &str = "未知岗位";

/// Sentinel used when a listing has no extractable company name
pub const UNKNOWN_COMPANY: &str = "未知公司";

/// Sentinel used when a listing has no company classification
pub const UNKNOWN_COMPANY_TYPE: &str = "未知";

/// Sentinel used when a listing does not publish its salary
pub const SALARY_UNPUBLISHED: &str = "未公布";

/// The job board (and acquisition path) a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceName {
    /// shixiseng.com, fetched over plain HTTP
    Shixiseng,

    /// lagou.com, rendered in a headless browser
    Lagou,

    /// lagou.com structured search API (secondary path)
    LagouApi,
}

impl SourceName {
    /// Stable identifier used in configuration and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shixiseng => "shixiseng",
            Self::Lagou => "lagou",
            Self::LagouApi => "lagou-api",
        }
    }

    /// Human-facing site name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Shixiseng => "实习僧",
            Self::Lagou => "拉勾网",
            Self::LagouApi => "拉勾网API",
        }
    }

    /// Returns all known sources
    pub fn all() -> [Self; 3] {
        [Self::Shixiseng, Self::Lagou, Self::LagouApi]
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shixiseng" => Ok(Self::Shixiseng),
            "lagou" => Ok(Self::Lagou),
            "lagou-api" | "lagou_api" => Ok(Self::LagouApi),
            other => Err(format!(
                "unknown source '{}' (expected shixiseng, lagou or lagou-api)",
                other
            )),
        }
    }
}

/// One internship listing in canonical form
///
/// `title`, `company` and `source_name` are always populated; blank values are
/// replaced by sentinels at construction. `salary_raw` is always the decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    title: String,
    company: String,
    company_type: String,
    salary_raw: String,
    skills_raw: String,
    source_name: SourceName,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail_url: Option<String>,
}

impl JobRecord {
    /// Starts a record for `source` with the given title and company
    pub fn new(source: SourceName, title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: or_sentinel(title.into(), UNKNOWN_TITLE),
            company: or_sentinel(company.into(), UNKNOWN_COMPANY),
            company_type: UNKNOWN_COMPANY_TYPE.to_string(),
            salary_raw: SALARY_UNPUBLISHED.to_string(),
            skills_raw: String::new(),
            source_name: source,
            detail_url: None,
        }
    }

    pub fn with_company_type(mut self, company_type: impl Into<String>) -> Self {
        self.company_type = or_sentinel(company_type.into(), UNKNOWN_COMPANY_TYPE);
        self
    }

    pub fn with_salary(mut self, salary: impl Into<String>) -> Self {
        self.salary_raw = or_sentinel(salary.into(), SALARY_UNPUBLISHED);
        self
    }

    pub fn with_skills(mut self, skills: impl Into<String>) -> Self {
        self.skills_raw = skills.into().trim().to_string();
        self
    }

    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = Some(url.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn company_type(&self) -> &str {
        &self.company_type
    }

    pub fn salary_raw(&self) -> &str {
        &self.salary_raw
    }

    pub fn skills_raw(&self) -> &str {
        &self.skills_raw
    }

    pub fn source_name(&self) -> SourceName {
        self.source_name
    }

    pub fn detail_url(&self) -> Option<&str> {
        self.detail_url.as_deref()
    }
}

fn or_sentinel(value: String, sentinel: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        sentinel.to_string()
    } else {
        trimmed.to_string()
    }
}
