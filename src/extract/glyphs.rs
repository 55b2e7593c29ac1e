//! Glyph substitution decoding
//!
//! Some boards render numbers with a private icon font: the markup contains
//! private-use codepoints that only look like digits once the font is applied.
//! A static per-source table maps those codepoints back to real characters.
//!
//! The tables are configuration, not learned. When a board rotates its font the
//! table silently goes stale and decoded salaries keep their private-use glyphs.

use crate::config::Config;
use crate::record::SourceName;
use crate::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from substituted codepoints to the characters they depict
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphTable {
    map: HashMap<char, char>,
}

impl GlyphTable {
    /// Builds a table from character pairs
    ///
    /// Pairs whose replacement is itself a substituted glyph are rejected so
    /// that decoding stays idempotent.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (char, char)>,
    {
        let map: HashMap<char, char> = pairs.into_iter().collect();

        if let Some((glyph, real)) = map.iter().find(|(_, real)| map.contains_key(real)) {
            return Err(ConfigError::InvalidGlyph(format!(
                "U+{:04X} maps to '{}', which is itself a substituted glyph",
                *glyph as u32, real
            )));
        }

        Ok(Self { map })
    }

    /// Builds a table from string entries as they appear in TOML
    ///
    /// Every key and value must be exactly one character.
    pub fn from_strings(entries: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut pairs = Vec::with_capacity(entries.len());
        for (glyph, real) in entries {
            pairs.push((single_char(glyph)?, single_char(real)?));
        }
        Self::from_pairs(pairs)
    }

    /// The icon-font table shixiseng.com used for salaries
    pub fn shixiseng_default() -> Self {
        let map = [
            ('\u{e0a8}', '0'),
            ('\u{e0b9}', '1'),
            ('\u{e0d8}', '2'),
            ('\u{e0e4}', '3'),
            ('\u{e0f6}', '4'),
            ('\u{e1a2}', '5'),
            ('\u{e1b8}', '6'),
            ('\u{e1c7}', '7'),
            ('\u{e1d5}', '8'),
            ('\u{e1e9}', '9'),
            ('\u{e24a}', '-'),
            ('\u{e2f3}', '/'),
        ]
        .into_iter()
        .collect();

        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up the real character for a glyph
    pub fn get(&self, glyph: char) -> Option<char> {
        self.map.get(&glyph).copied()
    }
}

/// Replaces every substituted glyph in `text` with the character it depicts
///
/// Characters that are not in the table pass through unchanged.
///
/// # Example
///
/// ```
/// use intern_scout::extract::{decode, GlyphTable};
///
/// let table = GlyphTable::from_pairs([('\u{e0a8}', '0'), ('\u{e1a2}', '5')]).unwrap();
/// assert_eq!(decode("\u{e0a8}\u{e1a2}k", &table), "05k");
/// ```
pub fn decode(text: &str, table: &GlyphTable) -> String {
    text.chars().map(|c| table.get(c).unwrap_or(c)).collect()
}

/// Read-only glyph tables for every source, built once at startup
#[derive(Debug, Clone)]
pub struct GlyphTables {
    tables: HashMap<SourceName, Arc<GlyphTable>>,
    empty: Arc<GlyphTable>,
}

impl Default for GlyphTables {
    fn default() -> Self {
        let mut tables = HashMap::new();
        tables.insert(
            SourceName::Shixiseng,
            Arc::new(GlyphTable::shixiseng_default()),
        );

        Self {
            tables,
            empty: Arc::new(GlyphTable::default()),
        }
    }
}

impl GlyphTables {
    /// Built-in tables overridden by any `[glyphs.<source>]` sections
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut tables = Self::default();

        for (source, entries) in &config.glyphs {
            let source: SourceName = source.parse().map_err(ConfigError::Validation)?;
            let table = GlyphTable::from_strings(entries)?;
            tracing::debug!("Loaded {} glyph mappings for {}", table.len(), source);
            tables.tables.insert(source, Arc::new(table));
        }

        Ok(tables)
    }

    /// The table for `source`, or an empty table when none is configured
    pub fn for_source(&self, source: SourceName) -> Arc<GlyphTable> {
        self.tables
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }
}

fn single_char(value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidGlyph(format!(
            "'{}' must be exactly one character",
            value
        ))),
    }
}
