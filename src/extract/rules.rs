//! Declarative field extraction
//!
//! Each field of a listing is described by a `FieldRule`: where to look, how to
//! turn the matched elements into text, and which sentinel to use when nothing
//! usable is found. A card or detail page is then reduced to a `CardOutcome`
//! without any per-site control flow.

use crate::extract::glyphs::{decode, GlyphTable};
use crate::record::{JobRecord, SourceName};
use crate::ScoutError;
use scraper::{ElementRef, Selector};
use std::collections::HashMap;

/// A field of `JobRecord` that can be extracted from markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobField {
    Title,
    Company,
    CompanyType,
    Salary,
    Skills,
}

impl JobField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Company => "company",
            Self::CompanyType => "company_type",
            Self::Salary => "salary",
            Self::Skills => "skills",
        }
    }
}

/// How matched elements become a field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Trimmed text of the first match
    Text,

    /// Trimmed text of every match, joined with the delimiter
    Joined(String),

    /// Text of the first match up to the delimiter; a miss if the delimiter is absent
    BeforeDelimiter(char),
}

/// One extraction rule: `(selector, field, sentinel on miss)`
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: JobField,
    pub selector: String,
    pub sentinel: String,
    pub capture: Capture,
    /// Run the text through the source's glyph table before capture
    pub decode_glyphs: bool,
}

impl FieldRule {
    pub fn text(field: JobField, selector: &str, sentinel: &str) -> Self {
        Self {
            field,
            selector: selector.to_string(),
            sentinel: sentinel.to_string(),
            capture: Capture::Text,
            decode_glyphs: false,
        }
    }

    pub fn joined(field: JobField, selector: &str, delimiter: &str) -> Self {
        Self {
            capture: Capture::Joined(delimiter.to_string()),
            ..Self::text(field, selector, "")
        }
    }

    pub fn before(field: JobField, selector: &str, delimiter: char, sentinel: &str) -> Self {
        Self {
            capture: Capture::BeforeDelimiter(delimiter),
            ..Self::text(field, selector, sentinel)
        }
    }

    pub fn decoded(mut self) -> Self {
        self.decode_glyphs = true;
        self
    }
}

/// Result of extracting a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Extracted(String),
    Sentinel(String),
}

impl FieldOutcome {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel(_))
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Extracted(v) | Self::Sentinel(v) => v,
        }
    }

    fn into_value(self) -> String {
        match self {
            Self::Extracted(v) | Self::Sentinel(v) => v,
        }
    }
}

/// Result of extracting one listing card or detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    Record(JobRecord),
    /// Neither title nor company could be found
    Dropped,
}

/// Field outcomes for one listing
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    fields: HashMap<JobField, FieldOutcome>,
}

impl ExtractedFields {
    pub fn get(&self, field: JobField) -> Option<&FieldOutcome> {
        self.fields.get(&field)
    }

    /// Fields that fell back to their sentinel
    pub fn missing(&self) -> Vec<JobField> {
        let mut missing: Vec<JobField> = self
            .fields
            .iter()
            .filter(|(_, outcome)| outcome.is_sentinel())
            .map(|(field, _)| *field)
            .collect();
        missing.sort_by_key(|f| f.as_str());
        missing
    }

    /// Builds the record, unless both title and company are missing
    pub fn into_outcome(mut self, source: SourceName, detail_url: Option<&str>) -> CardOutcome {
        let title = self.fields.remove(&JobField::Title);
        let company = self.fields.remove(&JobField::Company);

        let title_missing = title.as_ref().map_or(true, FieldOutcome::is_sentinel);
        let company_missing = company.as_ref().map_or(true, FieldOutcome::is_sentinel);
        if title_missing && company_missing {
            return CardOutcome::Dropped;
        }

        let mut record = JobRecord::new(
            source,
            title.map(FieldOutcome::into_value).unwrap_or_default(),
            company.map(FieldOutcome::into_value).unwrap_or_default(),
        );

        if let Some(v) = self.fields.remove(&JobField::CompanyType) {
            record = record.with_company_type(v.into_value());
        }
        if let Some(v) = self.fields.remove(&JobField::Salary) {
            record = record.with_salary(v.into_value());
        }
        if let Some(v) = self.fields.remove(&JobField::Skills) {
            record = record.with_skills(v.into_value());
        }
        if let Some(url) = detail_url {
            record = record.with_detail_url(url);
        }

        CardOutcome::Record(record)
    }
}

/// A rule set with its selectors parsed
#[derive(Debug)]
pub struct CompiledRules {
    rules: Vec<(FieldRule, Selector)>,
}

impl CompiledRules {
    pub fn compile(rules: &[FieldRule]) -> Result<Self, ScoutError> {
        let rules = rules
            .iter()
            .map(|rule| Ok((rule.clone(), parse_selector(&rule.selector)?)))
            .collect::<Result<Vec<_>, ScoutError>>()?;
        Ok(Self { rules })
    }

    /// Applies every rule within `scope`
    ///
    /// A rule that matches nothing yields its sentinel; it never affects other fields.
    pub fn extract(&self, scope: ElementRef<'_>, glyphs: &GlyphTable) -> ExtractedFields {
        let mut fields = HashMap::with_capacity(self.rules.len());

        for (rule, selector) in &self.rules {
            let outcome = apply_rule(rule, selector, scope, glyphs);
            if let FieldOutcome::Sentinel(ref sentinel) = outcome {
                tracing::debug!(
                    field = rule.field.as_str(),
                    selector = %rule.selector,
                    "Field missing, using sentinel {:?}",
                    sentinel
                );
            }
            fields.insert(rule.field, outcome);
        }

        ExtractedFields { fields }
    }
}

fn apply_rule(
    rule: &FieldRule,
    selector: &Selector,
    scope: ElementRef<'_>,
    glyphs: &GlyphTable,
) -> FieldOutcome {
    let text_of = |element: ElementRef<'_>| {
        let raw = element.text().collect::<String>();
        let text = if rule.decode_glyphs {
            decode(&raw, glyphs)
        } else {
            raw
        };
        text.trim().to_string()
    };

    let captured = match &rule.capture {
        Capture::Text => scope.select(selector).next().map(text_of),
        Capture::Joined(delimiter) => {
            let parts: Vec<String> = scope
                .select(selector)
                .map(text_of)
                .filter(|t| !t.is_empty())
                .collect();
            Some(parts.join(delimiter))
        }
        Capture::BeforeDelimiter(delimiter) => scope
            .select(selector)
            .next()
            .map(text_of)
            .and_then(|text| {
                text.split_once(*delimiter)
                    .map(|(head, _)| head.trim().to_string())
            }),
    };

    match captured {
        Some(value) if !value.is_empty() => FieldOutcome::Extracted(value),
        _ => FieldOutcome::Sentinel(rule.sentinel.clone()),
    }
}

/// Parses a CSS selector, mapping failures into `ScoutError`
pub fn parse_selector(selector: &str) -> Result<Selector, ScoutError> {
    Selector::parse(selector).map_err(|e| ScoutError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
