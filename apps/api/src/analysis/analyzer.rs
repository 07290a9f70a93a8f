//! Content Analyzer: deterministic compliance report for generated content.
//!
//! Every requirement becomes one check with a target, an observed count and a
//! pass flag. `passes_validation` is the conjunction of all gating checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::headings::{count_headings, HeadingCounts};
use crate::analysis::text::{count_phrase, density, plain_text, tokenize};
use crate::analysis::ContentKind;
use crate::requirements::{HeadingLevel, Requirements};

/// Share of the target word count that still passes.
const WORD_COUNT_TOLERANCE_PCT: usize = 90;

// ────────────────────────────────────────────────────────────────────────────
// Report types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCountCheck {
    pub actual: usize,
    pub target: u32,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCheck {
    pub level: HeadingLevel,
    pub required: u32,
    pub actual: u32,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCheck {
    pub keyword: String,
    pub target: u32,
    pub count: usize,
    pub density: f64,
    pub passed: bool,
}

/// Keyword counts merged across categories by lower-cased key (max, not sum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub counts: BTreeMap<String, usize>,
    pub unique_keywords: usize,
    pub total_occurrences: usize,
    pub density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    WordCount,
    HeadingCount,
    KeywordFrequency,
    MissingVariation,
    MissingEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub keyword: String,
    pub required: u32,
    pub found: u32,
    pub fix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub word_count: WordCountCheck,
    pub heading_counts: HeadingCounts,
    pub headings: Vec<HeadingCheck>,
    pub primary_keyword: KeywordCheck,
    pub lsi_keywords: Vec<KeywordCheck>,
    pub variations: Vec<KeywordCheck>,
    pub entities: Vec<KeywordCheck>,
    pub aggregate: Aggregate,
    pub issues: Vec<Issue>,
    pub passes_validation: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

pub fn analyze(content: &str, requirements: &Requirements, kind: ContentKind) -> AnalysisReport {
    let tokens = tokenize(&plain_text(content, kind));
    let words = tokens.len();

    let word_count = WordCountCheck {
        actual: words,
        target: requirements.word_count,
        passed: words * 100 >= requirements.word_count as usize * WORD_COUNT_TOLERANCE_PCT,
    };

    let heading_counts = count_headings(content, kind);
    let headings = heading_checks(requirements, &heading_counts);

    let check = |keyword: &str, target: u32| {
        let count = count_phrase(&tokens, keyword);
        KeywordCheck {
            keyword: keyword.to_string(),
            target,
            count,
            density: density(count, words),
            passed: count >= target as usize,
        }
    };

    let primary_target = requirements
        .lsi_keywords
        .get(&requirements.primary_keyword)
        .unwrap_or(1);
    let primary_keyword = check(&requirements.primary_keyword, primary_target);

    let lsi_keywords: Vec<KeywordCheck> = requirements
        .lsi_keywords
        .ranked()
        .into_iter()
        .map(|(keyword, target)| check(keyword, target))
        .collect();
    let variations: Vec<KeywordCheck> = requirements.variations.iter().map(|v| check(v, 1)).collect();
    let entities: Vec<KeywordCheck> = requirements.entities.iter().map(|e| check(e, 1)).collect();

    let aggregate = aggregate(
        std::iter::once(&primary_keyword)
            .chain(&lsi_keywords)
            .chain(&variations)
            .chain(&entities),
        words,
    );

    let issues = collect_issues(
        &word_count,
        &headings,
        &primary_keyword,
        &lsi_keywords,
        &variations,
        &entities,
    );
    let passes_validation = issues.is_empty();

    info!(
        "Analyzed content for '{}': {} words, {} issues, passes_validation={}",
        requirements.primary_keyword,
        words,
        issues.len(),
        passes_validation
    );

    AnalysisReport {
        word_count,
        heading_counts,
        headings,
        primary_keyword,
        lsi_keywords,
        variations,
        entities,
        aggregate,
        issues,
        passes_validation,
    }
}

/// H1 is reported against "exactly one" but only H2..H6 quotas gate.
fn heading_checks(requirements: &Requirements, counts: &HeadingCounts) -> Vec<HeadingCheck> {
    let actual = |level: HeadingLevel| counts.get(&level).copied().unwrap_or(0);

    let h1 = actual(HeadingLevel::H1);
    let mut checks = vec![HeadingCheck {
        level: HeadingLevel::H1,
        required: 1,
        actual: h1,
        passed: h1 == 1,
    }];

    for level in HeadingLevel::QUOTA_LEVELS {
        let required = requirements.heading_structure.get(level);
        if required == 0 {
            continue;
        }
        checks.push(HeadingCheck {
            level,
            required,
            actual: actual(level),
            passed: actual(level) >= required,
        });
    }

    checks
}

pub fn aggregate<'a>(checks: impl IntoIterator<Item = &'a KeywordCheck>, words: usize) -> Aggregate {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for check in checks {
        let key = check.keyword.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let slot = counts.entry(key).or_insert(0);
        *slot = (*slot).max(check.count);
    }

    let total_occurrences = counts.values().sum();
    debug!(
        "Aggregate: {} unique keywords, {} occurrences",
        counts.len(),
        total_occurrences
    );

    Aggregate {
        unique_keywords: counts.len(),
        total_occurrences,
        density: density(total_occurrences, words),
        counts,
    }
}

fn collect_issues(
    word_count: &WordCountCheck,
    headings: &[HeadingCheck],
    primary: &KeywordCheck,
    lsi: &[KeywordCheck],
    variations: &[KeywordCheck],
    entities: &[KeywordCheck],
) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !word_count.passed {
        let missing = (word_count.target as usize).saturating_sub(word_count.actual);
        issues.push(Issue {
            kind: IssueKind::WordCount,
            keyword: String::new(),
            required: word_count.target,
            found: word_count.actual as u32,
            fix: format!("Expand the content by roughly {missing} words."),
        });
    }

    for check in headings.iter().filter(|h| h.level != HeadingLevel::H1 && !h.passed) {
        issues.push(Issue {
            kind: IssueKind::HeadingCount,
            keyword: check.level.to_string(),
            required: check.required,
            found: check.actual,
            fix: format!(
                "Add {} more {} heading(s).",
                check.required - check.actual,
                check.level
            ),
        });
    }

    for check in std::iter::once(primary).chain(lsi).filter(|c| !c.passed) {
        issues.push(Issue {
            kind: IssueKind::KeywordFrequency,
            keyword: check.keyword.clone(),
            required: check.target,
            found: check.count as u32,
            fix: format!(
                "Use '{}' {} more time(s).",
                check.keyword,
                check.target as usize - check.count
            ),
        });
    }

    for (kind, checks) in [
        (IssueKind::MissingVariation, variations),
        (IssueKind::MissingEntity, entities),
    ] {
        for check in checks.iter().filter(|c| !c.passed) {
            issues.push(Issue {
                kind,
                keyword: check.keyword.clone(),
                required: 1,
                found: 0,
                fix: format!("Mention '{}' at least once.", check.keyword),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::{HeadingStructure, LsiSource};

    fn requirements() -> Requirements {
        Requirements {
            primary_keyword: "seo".into(),
            word_count: 10,
            lsi_keywords: LsiSource::FromMapping(vec![("seo".into(), 2), ("ranking".into(), 1)])
                .into(),
            heading_structure: HeadingStructure::default(),
            ..Requirements::default()
        }
    }

    #[test]
    fn test_aggregate_takes_max_not_sum() {
        let content = "# SEO basics\nseo tips for seo and ranking pages that rank well";
        let report = analyze(content, &requirements(), ContentKind::Markdown);

        assert_eq!(report.primary_keyword.count, 3);
        assert_eq!(report.primary_keyword.target, 2);
        let lsi_seo = report
            .lsi_keywords
            .iter()
            .find(|c| c.keyword == "seo")
            .unwrap();
        assert_eq!(lsi_seo.count, 3);

        assert_eq!(report.aggregate.counts["seo"], 3);
        assert_eq!(report.aggregate.unique_keywords, 2);
        assert_eq!(report.aggregate.total_occurrences, 4);
    }

    #[test]
    fn test_empty_content_has_zero_density() {
        let report = analyze("", &requirements(), ContentKind::Markdown);
        assert_eq!(report.word_count.actual, 0);
        assert_eq!(report.primary_keyword.density, 0.0);
        assert_eq!(report.aggregate.density, 0.0);
        assert!(!report.passes_validation);
    }

    #[test]
    fn test_word_count_tolerance() {
        let mut req = requirements();
        req.lsi_keywords = Default::default();
        req.primary_keyword = "alpha".into();
        req.word_count = 10;

        let nine = "alpha b c d e f g h i";
        assert!(analyze(nine, &req, ContentKind::Markdown).word_count.passed);
        let eight = "alpha b c d e f g h";
        let report = analyze(eight, &req, ContentKind::Markdown);
        assert!(!report.word_count.passed);
        assert_eq!(report.issues[0].kind, IssueKind::WordCount);
    }

    #[test]
    fn test_heading_quota_issues() {
        let mut req = requirements();
        req.heading_structure = [(HeadingLevel::H2, 2), (HeadingLevel::H3, 1)]
            .into_iter()
            .collect();
        let content = "# seo\n## seo one\nseo ranking words words words words words";
        let report = analyze(content, &req, ContentKind::Markdown);

        let h2 = report
            .headings
            .iter()
            .find(|h| h.level == HeadingLevel::H2)
            .unwrap();
        assert_eq!((h2.required, h2.actual, h2.passed), (2, 1, false));
        let heading_issues: Vec<&str> = report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::HeadingCount)
            .map(|i| i.keyword.as_str())
            .collect();
        assert_eq!(heading_issues, vec!["H2", "H3"]);
        assert!(!report.passes_validation);
    }

    #[test]
    fn test_extra_h1_reported_but_not_gating() {
        let mut req = requirements();
        req.word_count = 1;
        let content = "# seo\n# seo again\nseo ranking";
        let report = analyze(content, &req, ContentKind::Markdown);
        assert!(!report.headings[0].passed);
        assert!(report.passes_validation);
    }

    #[test]
    fn test_missing_entities_and_variations_are_issues() {
        let mut req = requirements();
        req.word_count = 1;
        req.variations = vec!["search optimization".into()];
        req.entities = vec!["Google".into()];
        let report = analyze("seo seo ranking", &req, ContentKind::Markdown);

        let kinds: Vec<IssueKind> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::MissingVariation, IssueKind::MissingEntity]);
        assert_eq!(report.issues[1].keyword, "Google");
    }

    #[test]
    fn test_primary_target_defaults_to_one() {
        let mut req = requirements();
        req.primary_keyword = "search".into();
        req.word_count = 1;
        let report = analyze("search seo seo ranking", &req, ContentKind::Markdown);
        assert_eq!(report.primary_keyword.target, 1);
        assert!(report.primary_keyword.passed);
    }

    #[test]
    fn test_html_content() {
        let mut req = requirements();
        req.word_count = 3;
        req.heading_structure = [(HeadingLevel::H2, 1)].into_iter().collect();
        let html = "<h1>SEO</h1><h2>Ranking</h2><p>seo and more seo</p>";
        let report = analyze(html, &req, ContentKind::Html);
        assert_eq!(report.heading_counts[&HeadingLevel::H2], 1);
        assert_eq!(report.primary_keyword.count, 3);
        assert!(report.passes_validation);
    }
}
