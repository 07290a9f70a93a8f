//! Requirements Normalizer: reconciles caller overrides with extracted values.
//!
//! Overrides are the only thing allowed to replace an extracted value; every
//! other step either fills a default or removes an exact duplicate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::requirements::models::{
    keyword_from_url, HeadingLevel, Requirements, DEFAULT_WORD_COUNT, PLACEHOLDER_URL,
    SYNONYM_COUNT,
};

/// Caller-supplied heading counts. Zero means "keep the report's value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingOverrides {
    pub h2: u32,
    pub h3: u32,
    pub h4: u32,
    pub h5: u32,
    pub h6: u32,
}

impl HeadingOverrides {
    pub fn get(&self, level: HeadingLevel) -> u32 {
        match level {
            HeadingLevel::H1 => 0,
            HeadingLevel::H2 => self.h2,
            HeadingLevel::H3 => self.h3,
            HeadingLevel::H4 => self.h4,
            HeadingLevel::H5 => self.h5,
            HeadingLevel::H6 => self.h6,
        }
    }

    pub fn set(&mut self, level: HeadingLevel, count: u32) {
        match level {
            HeadingLevel::H1 => {}
            HeadingLevel::H2 => self.h2 = count,
            HeadingLevel::H3 => self.h3 = count,
            HeadingLevel::H4 => self.h4 = count,
            HeadingLevel::H5 => self.h5 = count,
            HeadingLevel::H6 => self.h6 = count,
        }
    }

    /// Levels with an override > 0, in level order.
    pub fn active(&self) -> impl Iterator<Item = (HeadingLevel, u32)> + '_ {
        HeadingLevel::QUOTA_LEVELS
            .into_iter()
            .map(|level| (level, self.get(level)))
            .filter(|(_, count)| *count > 0)
    }
}

/// Everything a caller may adjust before generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOverrides {
    #[serde(flatten)]
    pub headings: HeadingOverrides,
    pub word_count: Option<u32>,
    pub lsi_limit: Option<usize>,
}

/// Directive placed ahead of the report's requirements in the prompt.
pub fn heading_override_directive(level: HeadingLevel, count: u32) -> String {
    format!(
        "IMPORTANT: Use exactly {count} {level} headings. \
        Disregard any other {level} heading count stated in these requirements."
    )
}

/// Level named by a directive built with `heading_override_directive`.
fn directive_level(directive: &str) -> Option<HeadingLevel> {
    let rest = directive.strip_prefix("IMPORTANT: Use exactly ")?;
    let (_, rest) = rest.split_once(' ')?;
    let (level, _) = rest.split_once(" headings.")?;
    HeadingLevel::QUOTA_LEVELS
        .into_iter()
        .find(|l| l.to_string() == level)
}

/// Applies heading overrides and fills defaults for anything left empty.
pub fn normalize(mut raw: Requirements, overrides: &HeadingOverrides) -> Requirements {
    for (level, count) in overrides.active() {
        let previous = raw.heading_structure.remove(level);
        raw.heading_structure.set(level, count);

        raw.heading_overrides
            .retain(|directive| directive_level(directive) != Some(level));
        raw.heading_overrides.push(heading_override_directive(level, count));
        info!("{level} quota overridden: {previous:?} -> {count}");
    }

    raw.variations = dedup_preserving_order(raw.variations);
    raw.entities = dedup_preserving_order(raw.entities);
    raw.synonyms = dedup_preserving_order(raw.synonyms);
    if raw.synonyms.is_empty() {
        raw.synonyms = raw.variations.iter().take(SYNONYM_COUNT).cloned().collect();
    }

    if raw.word_count == 0 {
        debug!("word_count was 0, using default {DEFAULT_WORD_COUNT}");
        raw.word_count = DEFAULT_WORD_COUNT;
    }

    if raw.url.trim().is_empty() {
        raw.url = PLACEHOLDER_URL.to_string();
    }

    raw.primary_keyword = raw.primary_keyword.trim().to_string();
    if raw.primary_keyword.is_empty() {
        raw.primary_keyword = raw
            .synonyms
            .first()
            .or_else(|| raw.variations.first())
            .cloned()
            .unwrap_or_else(|| keyword_from_url(&raw.url));
        debug!("primary keyword filled from fallback: {}", raw.primary_keyword);
    }

    raw.recompute_total_headings();
    raw
}

/// Normalizes with heading overrides, then applies the word-count override.
/// Returns the requirements and the LSI limit to use when building prompts.
pub fn apply_overrides(
    requirements: Requirements,
    overrides: &GenerationOverrides,
    default_lsi_limit: usize,
) -> (Requirements, usize) {
    let mut requirements = normalize(requirements, &overrides.headings);

    if let Some(word_count) = overrides.word_count.filter(|w| *w > 0) {
        info!(
            "word_count overridden: {} -> {word_count}",
            requirements.word_count
        );
        requirements.word_count = word_count;
    }

    let lsi_limit = overrides
        .lsi_limit
        .filter(|l| *l > 0)
        .unwrap_or(default_lsi_limit);

    (requirements, lsi_limit)
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::models::{HeadingStructure, LsiSource};

    fn extracted() -> Requirements {
        Requirements {
            primary_keyword: "hiking boots".into(),
            variations: vec!["trail boots".into(), "hiking shoes".into()],
            heading_structure: [(HeadingLevel::H2, 3), (HeadingLevel::H3, 6)]
                .into_iter()
                .collect(),
            ..Requirements::default()
        }
    }

    #[test]
    fn test_second_override_replaces_directive_for_same_level() {
        let first = normalize(
            extracted(),
            &HeadingOverrides {
                h2: 5,
                h3: 4,
                ..HeadingOverrides::default()
            },
        );
        let second = normalize(
            first,
            &HeadingOverrides {
                h2: 7,
                ..HeadingOverrides::default()
            },
        );

        assert_eq!(second.heading_structure.get(HeadingLevel::H2), 7);
        assert_eq!(
            second.heading_overrides,
            vec![
                heading_override_directive(HeadingLevel::H3, 4),
                heading_override_directive(HeadingLevel::H2, 7),
            ]
        );
    }

    #[test]
    fn test_huge_override_does_not_overflow_total() {
        let req = normalize(
            extracted(),
            &HeadingOverrides {
                h2: u32::MAX,
                ..HeadingOverrides::default()
            },
        );
        assert_eq!(req.heading_structure.get(HeadingLevel::H2), u32::MAX);
        assert_eq!(req.total_headings, u32::MAX);
    }

    #[test]
    fn test_override_replaces_quota_and_adds_directive() {
        let overrides = HeadingOverrides {
            h2: 5,
            ..HeadingOverrides::default()
        };
        let req = normalize(extracted(), &overrides);

        assert_eq!(req.heading_structure.get(HeadingLevel::H2), 5);
        assert_eq!(req.heading_structure.get(HeadingLevel::H3), 6);
        assert_eq!(req.heading_overrides.len(), 1);
        assert!(req.heading_overrides[0].contains("H2"));
        assert!(req.heading_overrides[0].contains('5'));
    }

    #[test]
    fn test_every_positive_override_wins() {
        for level in HeadingLevel::QUOTA_LEVELS {
            for value in [1_u32, 4, 12] {
                let mut overrides = HeadingOverrides::default();
                overrides.set(level, value);
                let req = normalize(extracted(), &overrides);
                assert_eq!(req.heading_structure.get(level), value);
                assert!(req
                    .heading_overrides
                    .iter()
                    .any(|d| d.contains(&level.to_string()) && d.contains(&value.to_string())));
            }
        }
    }

    #[test]
    fn test_zero_override_keeps_extracted_value() {
        let req = normalize(extracted(), &HeadingOverrides::default());
        assert_eq!(req.heading_structure.get(HeadingLevel::H2), 3);
        assert!(req.heading_overrides.is_empty());
    }

    #[test]
    fn test_total_headings_recomputed() {
        let overrides = HeadingOverrides {
            h4: 2,
            ..HeadingOverrides::default()
        };
        let req = normalize(extracted(), &overrides);
        // 1 (H1) + 3 + 6 + 2
        assert_eq!(req.total_headings, 12);
    }

    #[test]
    fn test_normalize_twice_does_not_duplicate_directive() {
        let overrides = HeadingOverrides {
            h3: 4,
            ..HeadingOverrides::default()
        };
        let once = normalize(extracted(), &overrides);
        let twice = normalize(once, &overrides);
        assert_eq!(twice.heading_overrides.len(), 1);
    }

    #[test]
    fn test_defaults_filled() {
        let raw = Requirements {
            primary_keyword: "   ".into(),
            word_count: 0,
            url: String::new(),
            variations: vec!["Trail Boots".into(), "trail boots".into(), "".into()],
            ..Requirements::default()
        };
        let req = normalize(raw, &HeadingOverrides::default());
        assert_eq!(req.word_count, DEFAULT_WORD_COUNT);
        assert_eq!(req.url, PLACEHOLDER_URL);
        assert_eq!(req.variations, vec!["Trail Boots".to_string()]);
        assert_eq!(req.synonyms, vec!["Trail Boots".to_string()]);
        assert_eq!(req.primary_keyword, "Trail Boots");
    }

    #[test]
    fn test_primary_keyword_falls_back_to_url() {
        let raw = Requirements {
            primary_keyword: String::new(),
            url: "https://denver-roofing.com/".into(),
            ..Requirements::default()
        };
        let req = normalize(raw, &HeadingOverrides::default());
        assert_eq!(req.primary_keyword, "denver roofing");
    }

    #[test]
    fn test_non_empty_fields_survive() {
        let mut raw = extracted();
        raw.lsi_keywords = LsiSource::FromMapping(vec![("waterproof".into(), 2)]).into();
        raw.entities = vec!["Gore-Tex".into()];
        raw.requirements.insert("Number of H2 tags".into(), 3);
        let req = normalize(raw.clone(), &HeadingOverrides::default());
        assert_eq!(req.lsi_keywords, raw.lsi_keywords);
        assert_eq!(req.entities, raw.entities);
        assert_eq!(req.requirements, raw.requirements);
    }

    #[test]
    fn test_apply_overrides_word_count_and_lsi_limit() {
        let overrides = GenerationOverrides {
            word_count: Some(900),
            lsi_limit: Some(10),
            ..GenerationOverrides::default()
        };
        let (req, limit) = apply_overrides(extracted(), &overrides, 40);
        assert_eq!(req.word_count, 900);
        assert_eq!(limit, 10);

        let (req, limit) = apply_overrides(extracted(), &GenerationOverrides::default(), 40);
        assert_eq!(req.word_count, DEFAULT_WORD_COUNT);
        assert_eq!(limit, 40);
    }

    #[test]
    fn test_generation_overrides_flattened_json() {
        let overrides: GenerationOverrides =
            serde_json::from_str(r#"{"h2": 4, "word_count": 800}"#).unwrap();
        assert_eq!(overrides.headings.h2, 4);
        assert_eq!(overrides.word_count, Some(800));
        assert_eq!(overrides.lsi_limit, None);
    }

    #[test]
    fn test_empty_structure_total_is_one() {
        let raw = Requirements {
            heading_structure: HeadingStructure::default(),
            total_headings: 0,
            primary_keyword: "x".into(),
            ..Requirements::default()
        };
        assert_eq!(normalize(raw, &HeadingOverrides::default()).total_headings, 1);
    }
}
