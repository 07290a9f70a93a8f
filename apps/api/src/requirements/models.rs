//! Requirements: the structured SEO brief recovered from a CORA report.
//!
//! Built once per upload (extractor → normalizer), optionally adjusted by caller
//! overrides, then treated as read-only by the prompt builder and the analyzer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_WORD_COUNT: u32 = 1500;
pub const DEFAULT_TITLE_LENGTH: u32 = 60;
pub const DEFAULT_DESCRIPTION_LENGTH: u32 = 160;

/// Report code for the ideal meta title length.
pub const TITLE_LENGTH_CODE: &str = "CP480";
/// Report code for the ideal meta description length.
pub const DESCRIPTION_LENGTH_CODE: &str = "CP380";

pub const PLACEHOLDER_URL: &str = "https://example.com";

/// Synonyms are the leading variations.
pub const SYNONYM_COUNT: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Headings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub const ALL: [HeadingLevel; 6] = [
        HeadingLevel::H1,
        HeadingLevel::H2,
        HeadingLevel::H3,
        HeadingLevel::H4,
        HeadingLevel::H5,
        HeadingLevel::H6,
    ];

    /// Levels that carry a quota. H1 is always exactly one.
    pub const QUOTA_LEVELS: [HeadingLevel; 5] = [
        HeadingLevel::H2,
        HeadingLevel::H3,
        HeadingLevel::H4,
        HeadingLevel::H5,
        HeadingLevel::H6,
    ];

    /// Maps a markdown hash count / HTML heading digit to a level.
    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            4 => Some(HeadingLevel::H4),
            5 => Some(HeadingLevel::H5),
            6 => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    pub fn depth(self) -> usize {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.depth())
    }
}

/// Required heading count per level (H2..H6). Missing levels read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadingStructure(BTreeMap<HeadingLevel, u32>);

impl HeadingStructure {
    pub fn get(&self, level: HeadingLevel) -> u32 {
        self.0.get(&level).copied().unwrap_or(0)
    }

    /// Sets a quota. H1 is implicit and never stored.
    pub fn set(&mut self, level: HeadingLevel, count: u32) {
        if level != HeadingLevel::H1 {
            self.0.insert(level, count);
        }
    }

    pub fn remove(&mut self, level: HeadingLevel) -> Option<u32> {
        self.0.remove(&level)
    }

    /// 1 (the H1) plus every level quota, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.0
            .iter()
            .filter(|(level, _)| **level != HeadingLevel::H1)
            .fold(1u32, |total, (_, count)| total.saturating_add(*count))
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeadingLevel, u32)> + '_ {
        self.0.iter().map(|(level, count)| (*level, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(HeadingLevel, u32)> for HeadingStructure {
    fn from_iter<I: IntoIterator<Item = (HeadingLevel, u32)>>(iter: I) -> Self {
        let mut structure = HeadingStructure::default();
        for (level, count) in iter {
            structure.set(level, count);
        }
        structure
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LSI keywords
// ────────────────────────────────────────────────────────────────────────────

/// LSI keywords as they come out of a report or an API caller: either a bare
/// list (every keyword needs one mention) or keyword → minimum occurrences.
#[derive(Debug, Clone, PartialEq)]
pub enum LsiSource {
    FromList(Vec<String>),
    FromMapping(Vec<(String, u32)>),
}

/// Canonical LSI map: keyword → minimum occurrences (always ≥ 1).
///
/// Keys are unique case-insensitively; the first spelling seen is kept and
/// duplicate entries keep the larger target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LsiWire", into = "BTreeMap<String, u32>")]
pub struct LsiKeywords(BTreeMap<String, u32>);

impl LsiKeywords {
    pub fn insert(&mut self, keyword: &str, target: u32) {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return;
        }
        let target = target.max(1);
        let existing = self
            .0
            .keys()
            .find(|k| k.eq_ignore_ascii_case(keyword))
            .cloned();
        match existing {
            Some(key) => {
                let slot = self.0.entry(key).or_insert(target);
                *slot = (*slot).max(target);
            }
            None => {
                self.0.insert(keyword.to_string(), target);
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, keyword: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword.trim()))
            .map(|(_, v)| *v)
    }

    /// Keywords ordered by target (largest first), ties alphabetical.
    pub fn ranked(&self) -> Vec<(&str, u32)> {
        let mut ranked: Vec<(&str, u32)> = self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn top(&self, limit: usize) -> Vec<(&str, u32)> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<LsiSource> for LsiKeywords {
    fn from(source: LsiSource) -> Self {
        let mut keywords = LsiKeywords::default();
        match source {
            LsiSource::FromList(items) => {
                for item in items {
                    keywords.insert(&item, 1);
                }
            }
            LsiSource::FromMapping(pairs) => {
                for (keyword, target) in pairs {
                    keywords.insert(&keyword, target);
                }
            }
        }
        keywords
    }
}

impl From<LsiKeywords> for BTreeMap<String, u32> {
    fn from(keywords: LsiKeywords) -> Self {
        keywords.0
    }
}

/// JSON shapes accepted for `lsi_keywords`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LsiWire {
    List(Vec<String>),
    Mapping(BTreeMap<String, f64>),
}

impl From<LsiWire> for LsiKeywords {
    fn from(wire: LsiWire) -> Self {
        match wire {
            LsiWire::List(items) => LsiSource::FromList(items).into(),
            LsiWire::Mapping(map) => LsiSource::FromMapping(
                map.into_iter()
                    .map(|(k, v)| (k, v.max(1.0).ceil() as u32))
                    .collect(),
            )
            .into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requirements
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(state) => write!(f, "{}, {}", self.city, state),
            None => write!(f, "{}", self.city),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    pub primary_keyword: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub variations: Vec<String>,
    pub synonyms: Vec<String>,
    pub lsi_keywords: LsiKeywords,
    pub entities: Vec<String>,
    pub heading_structure: HeadingStructure,
    /// 1 (H1) + every heading quota. Kept in sync by the normalizer.
    pub total_headings: u32,
    pub word_count: u32,
    /// Generic label → quota bag (meta length caps live under CP480 / CP380).
    pub requirements: BTreeMap<String, u32>,
    pub heading_overrides: Vec<String>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            primary_keyword: String::new(),
            url: PLACEHOLDER_URL.to_string(),
            location: None,
            variations: vec![],
            synonyms: vec![],
            lsi_keywords: LsiKeywords::default(),
            entities: vec![],
            heading_structure: HeadingStructure::default(),
            total_headings: 1,
            word_count: DEFAULT_WORD_COUNT,
            requirements: BTreeMap::new(),
            heading_overrides: vec![],
        }
    }
}

impl Requirements {
    pub fn title_length(&self) -> u32 {
        self.requirements
            .get(TITLE_LENGTH_CODE)
            .copied()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TITLE_LENGTH)
    }

    pub fn description_length(&self) -> u32 {
        self.requirements
            .get(DESCRIPTION_LENGTH_CODE)
            .copied()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_DESCRIPTION_LENGTH)
    }

    pub fn recompute_total_headings(&mut self) {
        self.total_headings = self.heading_structure.total();
    }
}

/// Derives a keyword from a page URL: scheme, `www.` and the TLD are dropped,
/// separators become spaces. `https://best-hiking-boots.com/x` → "best hiking boots".
pub fn keyword_from_url(url: &str) -> String {
    let without_scheme = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);

    let mut labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() > 1 {
        labels.pop();
    }

    labels
        .join(" ")
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
