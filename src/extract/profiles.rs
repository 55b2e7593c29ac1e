//! Site profiles: the markup contract of each supported board
//!
//! Supporting a new board (or following a markup change) means editing the data
//! in this module, not the strategies that consume it.

use crate::extract::rules::{FieldRule, JobField};
use crate::record::{SALARY_UNPUBLISHED, UNKNOWN_COMPANY, UNKNOWN_COMPANY_TYPE, UNKNOWN_TITLE};

/// Markup contract for a board scraped with plain HTTP (listing page + detail pages)
#[derive(Debug, Clone)]
pub struct HttpSiteProfile {
    /// Path of the search listing, relative to the base URL
    pub listing_path: String,
    /// One element per listing on the search page
    pub listing_item: String,
    /// Link to the detail page, within a listing item
    pub detail_link: String,
    /// Field rules applied to the whole detail document
    pub detail_rules: Vec<FieldRule>,
}

impl HttpSiteProfile {
    pub fn shixiseng() -> Self {
        Self {
            listing_path: "interns".to_string(),
            listing_item: ".intern-wrap.intern-item".to_string(),
            detail_link: ".f-l.intern-detail__job a".to_string(),
            detail_rules: vec![
                FieldRule::text(JobField::Title, ".new_job_name", UNKNOWN_TITLE),
                FieldRule::text(JobField::Company, ".com_intro .com-name", UNKNOWN_COMPANY),
                FieldRule::text(JobField::Salary, ".job_money.cutom_font", SALARY_UNPUBLISHED)
                    .decoded(),
                FieldRule::joined(JobField::Skills, ".job_good_list span", ", "),
                FieldRule::text(JobField::CompanyType, ".com-type", UNKNOWN_COMPANY_TYPE),
            ],
        }
    }
}

/// Markup contract for a board scraped through a rendered browser page
#[derive(Debug, Clone)]
pub struct BrowserSiteProfile {
    /// Path of the keyword search page, relative to the base URL
    pub search_path: String,
    /// Query parameter carrying the keyword
    pub keyword_param: String,
    /// Element that proves the home page is live rather than a block page
    pub home_landmark: String,
    /// Any listing card, advertisements included (used for waiting)
    pub card_presence: String,
    /// Listing cards to extract, advertisements excluded
    pub card: String,
    /// Field rules applied within each card
    pub card_rules: Vec<FieldRule>,
    /// The "next page" control
    pub next_control: String,
    /// Class marking the next control as disabled
    pub disabled_class: String,
    /// Page-title fragments that indicate a verification wall
    pub interdiction_markers: Vec<String>,
}

impl BrowserSiteProfile {
    pub fn lagou() -> Self {
        Self {
            search_path: "wn/jobs".to_string(),
            keyword_param: "kd".to_string(),
            home_landmark: "#lg_header".to_string(),
            card_presence: "div.item__10RTO".to_string(),
            card: "div.item__10RTO:not(.ad-box)".to_string(),
            card_rules: vec![
                FieldRule::text(JobField::Title, "div.p-top__1F7CL a", UNKNOWN_TITLE),
                FieldRule::text(
                    JobField::Company,
                    "div.company-name__2-SjF a",
                    UNKNOWN_COMPANY,
                ),
                FieldRule::text(JobField::Salary, ".money__3Lkgq", SALARY_UNPUBLISHED).decoded(),
                FieldRule::before(
                    JobField::CompanyType,
                    ".ir___QwEG",
                    '·',
                    UNKNOWN_COMPANY_TYPE,
                ),
                FieldRule::joined(JobField::Skills, ".il__18pLK", ","),
            ],
            next_control: "button.lg-pagination-next".to_string(),
            disabled_class: "lg-pagination-disabled".to_string(),
            interdiction_markers: vec!["验证".to_string()],
        }
    }

    /// Returns the first interdiction marker contained in `title`
    pub fn interdiction_marker(&self, title: &str) -> Option<&str> {
        self.interdiction_markers
            .iter()
            .map(String::as_str)
            .find(|marker| title.contains(marker))
    }
}
