//! Extraction module: turning markup into job records
//!
//! This module contains:
//! - Glyph-substitution decoding for icon-font obfuscated numbers
//! - Declarative field rules with per-field sentinels
//! - The markup profiles of the supported boards

mod glyphs;
mod profiles;
mod rules;

pub use glyphs::{decode, GlyphTable, GlyphTables};
pub use profiles::{BrowserSiteProfile, HttpSiteProfile};
pub use rules::{
    parse_selector, Capture, CardOutcome, CompiledRules, ExtractedFields, FieldOutcome,
    FieldRule, JobField,
};
