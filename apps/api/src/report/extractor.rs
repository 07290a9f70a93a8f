//! Spreadsheet Extractor: recovers a `Requirements` object from a CORA report.
//!
//! Each field is resolved by its own strategy list (labelled cell, named
//! sheet, fixed coordinate, …). Once the workbook opens, extraction always
//! returns a best-effort object; only an unreadable file is an error.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::report::strategies::{
    adjacent_value, first_integer, first_number, first_success, inline_value, label_key,
    is_phase_marker, number_near, phase_number, scan_list, split_list, Strategy,
};
use crate::report::workbook::{ExtractError, Grid, Workbook};
use crate::requirements::models::{
    keyword_from_url, HeadingLevel, HeadingStructure, Location, LsiKeywords, LsiSource,
    Requirements, DEFAULT_WORD_COUNT, DESCRIPTION_LENGTH_CODE, PLACEHOLDER_URL, SYNONYM_COUNT,
    TITLE_LENGTH_CODE,
};

const BASIC_TUNINGS_SHEET: &str = "Basic Tunings";
const LSI_SHEET: &str = "LSI Keywords";
const ENTITY_SHEETS: [&str; 2] = ["Entity Mentions", "Entities"];

/// Report code for the target word count.
const WORD_COUNT_CODE: &str = "cp492";

const DEFAULT_H2_COUNT: u32 = 3;

const LSI_HEADERS: &[&str] = &[
    "keyword",
    "keywords",
    "lsi",
    "lsi keyword",
    "lsi keywords",
    "term",
    "terms",
    "phrase",
];
const ENTITY_HEADERS: &[&str] = &["entity", "entities", "entity mentions", "name", "entity name"];

/// Parses report bytes into requirements.
pub fn extract(bytes: &[u8]) -> Result<Requirements, ExtractError> {
    let workbook = Workbook::from_bytes(bytes)?;
    info!("Report opened with sheets {:?}", workbook.sheet_names());
    Ok(extract_from_workbook(&workbook))
}

/// Runs every field's strategy list against an already-loaded workbook.
pub fn extract_from_workbook(workbook: &Workbook) -> Requirements {
    let url = first_success("url", workbook, URL_STRATEGIES)
        .unwrap_or_else(|| PLACEHOLDER_URL.to_string());
    let location = extract_location_from_url(&url);

    let variations = first_success("variations", workbook, VARIATION_STRATEGIES).unwrap_or_default();

    let primary_keyword = first_success("primary keyword", workbook, PRIMARY_KEYWORD_STRATEGIES)
        .or_else(|| variations.first().cloned())
        .unwrap_or_else(|| keyword_from_url(&url));

    let mut requirements =
        first_success("requirements", workbook, REQUIREMENT_STRATEGIES).unwrap_or_default();
    if let Some(length) = first_success("meta title length", workbook, TITLE_LENGTH_STRATEGIES) {
        requirements.insert(TITLE_LENGTH_CODE.to_string(), length);
    }
    if let Some(length) =
        first_success("meta description length", workbook, DESCRIPTION_LENGTH_STRATEGIES)
    {
        requirements.insert(DESCRIPTION_LENGTH_CODE.to_string(), length);
    }

    let word_count =
        first_success("word count", workbook, WORD_COUNT_STRATEGIES).unwrap_or(DEFAULT_WORD_COUNT);

    let mut heading_structure =
        first_success("headings", workbook, HEADING_STRATEGIES).unwrap_or_default();
    apply_heading_defaults(&mut heading_structure);

    let lsi_keywords: LsiKeywords = first_success("lsi keywords", workbook, LSI_STRATEGIES)
        .or_else(|| {
            (!variations.is_empty()).then(|| {
                info!("No LSI keywords in report, using variations instead");
                LsiSource::FromList(variations.clone())
            })
        })
        .map(LsiKeywords::from)
        .unwrap_or_default();

    let entities = first_success("entities", workbook, ENTITY_STRATEGIES).unwrap_or_default();

    let synonyms = variations.iter().take(SYNONYM_COUNT).cloned().collect();

    let mut extracted = Requirements {
        primary_keyword,
        url,
        location,
        variations,
        synonyms,
        lsi_keywords,
        entities,
        heading_structure,
        total_headings: 1,
        word_count,
        requirements,
        heading_overrides: vec![],
    };
    extracted.recompute_total_headings();

    info!(
        "Extracted requirements for '{}': {} variations, {} LSI keywords, {} entities, \
        {} requirement rows, word_count={}",
        extracted.primary_keyword,
        extracted.variations.len(),
        extracted.lsi_keywords.len(),
        extracted.entities.len(),
        extracted.requirements.len(),
        extracted.word_count
    );

    extracted
}

// ────────────────────────────────────────────────────────────────────────────
// URL & location
// ────────────────────────────────────────────────────────────────────────────

const URL_STRATEGIES: &[Strategy<String>] = &[
    Strategy {
        name: "url in primary header window",
        run: url_in_primary_window,
    },
    Strategy {
        name: "url in basic tunings",
        run: url_in_basic_tunings,
    },
];

fn is_url(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn url_in_primary_window(workbook: &Workbook) -> Option<String> {
    let grid = workbook.primary();
    let (row, col) = grid.find_in_window(5, 3, is_url)?;
    Some(grid.cell(row, col).to_string())
}

fn url_in_basic_tunings(workbook: &Workbook) -> Option<String> {
    let grid = workbook.sheet(BASIC_TUNINGS_SHEET)?;
    let (row, col) = grid.find(is_url)?;
    Some(grid.cell(row, col).to_string())
}

/// City (and two-letter state) from the URL path, e.g. `/denver-co/` or
/// `/roofers-in-boulder`. The host is ignored.
pub fn extract_location_from_url(url: &str) -> Option<Location> {
    static CITY_STATE: OnceLock<Regex> = OnceLock::new();
    static NEAR_CITY: OnceLock<Regex> = OnceLock::new();

    let city_state = CITY_STATE.get_or_init(|| {
        Regex::new(r"(?i)[-_/]([a-z]+[-_]?[a-z]*?)[-_/]([a-z]{2})(?:[-_/]|$)").expect("static regex")
    });
    let near_city = NEAR_CITY.get_or_init(|| {
        Regex::new(r"(?i)[-_/](?:in|near)[-_]([a-z]+(?:[-_][a-z]+)*)").expect("static regex")
    });

    let without_scheme = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let path = without_scheme.find('/').map(|i| &without_scheme[i..])?;

    if let Some(caps) = near_city.captures(path) {
        let slug = &caps[1];
        return Some(match slug.rsplit_once(['-', '_']) {
            Some((city, state)) if state.len() == 2 => Location {
                city: title_case(city),
                state: Some(state.to_uppercase()),
            },
            _ => Location {
                city: title_case(slug),
                state: None,
            },
        });
    }

    city_state.captures(path).map(|caps| Location {
        city: title_case(&caps[1]),
        state: Some(caps[2].to_uppercase()),
    })
}

fn title_case(slug: &str) -> String {
    slug.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Primary keyword & variations
// ────────────────────────────────────────────────────────────────────────────

const PRIMARY_KEYWORD_STRATEGIES: &[Strategy<String>] = &[
    Strategy {
        name: "primary keyword label",
        run: primary_keyword_label,
    },
    Strategy {
        name: "basic tunings B1",
        run: primary_keyword_basic_tunings,
    },
];

/// Values that are really the next label, not the keyword itself.
/// Header text the extractor knows from other fields, never a keyword value.
fn looks_like_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.ends_with(':')
        || lower.contains("keyword")
        || lower.contains("variation")
        || lower.contains("heading")
        || lower.contains("entit")
        || lower.contains(&TITLE_LENGTH_CODE.to_lowercase())
        || lower.contains(&DESCRIPTION_LENGTH_CODE.to_lowercase())
        || is_word_count_label(text)
        || is_phase_marker(text)
        || is_url(text)
}

fn primary_keyword_label(workbook: &Workbook) -> Option<String> {
    let grid = workbook.primary();
    let (row, col) = grid.find_in_window(10, 3, |t| t.to_lowercase().contains("primary keyword"))?;
    let label = grid.cell(row, col);

    // Right-hand value for label/value rows, else the value under a header row.
    inline_value(label)
        .or_else(|| {
            [grid.cell(row, col + 1), grid.cell(row + 1, col)]
                .into_iter()
                .find(|t| !t.is_empty() && !looks_like_label(t))
        })
        .map(str::to_string)
}

fn primary_keyword_basic_tunings(workbook: &Workbook) -> Option<String> {
    let value = workbook.sheet(BASIC_TUNINGS_SHEET)?.cell(0, 1);
    (!value.is_empty()).then(|| value.to_string())
}

const VARIATION_STRATEGIES: &[Strategy<Vec<String>>] = &[
    Strategy {
        name: "variation label",
        run: variations_label,
    },
    Strategy {
        name: "delimited A2",
        run: variations_fixed_cell,
    },
];

fn variations_label(workbook: &Workbook) -> Option<Vec<String>> {
    let grid = workbook.primary();
    let (row, col) = grid.find_in_window(10, 3, |t| t.to_lowercase().contains("variation"))?;
    let raw = inline_value(grid.cell(row, col))
        .or_else(|| adjacent_value(grid, row, col, |t| !looks_like_label(t)))?;
    let variations = split_list(raw);
    (!variations.is_empty()).then_some(variations)
}

fn variations_fixed_cell(workbook: &Workbook) -> Option<Vec<String>> {
    let raw = workbook.primary().cell(1, 0);
    if !raw.contains([',', '|']) {
        return None;
    }
    let variations = split_list(raw);
    (!variations.is_empty()).then_some(variations)
}

// ────────────────────────────────────────────────────────────────────────────
// Requirements bag, meta lengths, word count
// ────────────────────────────────────────────────────────────────────────────

const REQUIREMENT_STRATEGIES: &[Strategy<BTreeMap<String, u32>>] = &[Strategy {
    name: "phase 1 section",
    run: phase_one_requirements,
}];

/// Label/amount rows between "Phase 1" and the next phase marker in column A.
fn phase_one_requirements(workbook: &Workbook) -> Option<BTreeMap<String, u32>> {
    let grid = workbook.primary();
    let start = (0..grid.height()).find(|&r| phase_number(grid.cell(r, 0)) == Some(1))? + 1;

    let mut bag = BTreeMap::new();
    for row in start..grid.height() {
        let label = grid.cell(row, 0);
        if phase_number(label).is_some_and(|n| n != 1) {
            break;
        }
        let amount = grid.cell(row, 1);
        if label.is_empty() || amount.is_empty() {
            continue;
        }
        if let Some(value) = first_integer(amount) {
            bag.entry(label.to_string()).or_insert(value);
        }
    }

    (!bag.is_empty()).then_some(bag)
}

const TITLE_LENGTH_STRATEGIES: &[Strategy<u32>] = &[
    Strategy {
        name: "title code in primary",
        run: |wb| code_value(wb.primary(), TITLE_LENGTH_CODE),
    },
    Strategy {
        name: "title code in basic tunings",
        run: title_code_basic_tunings,
    },
];

const DESCRIPTION_LENGTH_STRATEGIES: &[Strategy<u32>] = &[
    Strategy {
        name: "description code in primary",
        run: |wb| code_value(wb.primary(), DESCRIPTION_LENGTH_CODE),
    },
    Strategy {
        name: "description code in basic tunings",
        run: description_code_basic_tunings,
    },
];

fn title_code_basic_tunings(workbook: &Workbook) -> Option<u32> {
    code_value(workbook.sheet(BASIC_TUNINGS_SHEET)?, TITLE_LENGTH_CODE)
}

fn description_code_basic_tunings(workbook: &Workbook) -> Option<u32> {
    code_value(workbook.sheet(BASIC_TUNINGS_SHEET)?, DESCRIPTION_LENGTH_CODE)
}

/// Numeric value next to the first cell mentioning `code`.
fn code_value(grid: &Grid, code: &str) -> Option<u32> {
    let code = code.to_lowercase();
    let (row, col) = grid.find(|t| t.to_lowercase().contains(&code))?;
    number_near(grid, row, col)
}

const WORD_COUNT_STRATEGIES: &[Strategy<u32>] = &[
    Strategy {
        name: "word count label",
        run: word_count_label,
    },
    Strategy {
        name: "word count in basic tunings",
        run: word_count_basic_tunings,
    },
];

fn word_count_basic_tunings(workbook: &Workbook) -> Option<u32> {
    let grid = workbook.sheet(BASIC_TUNINGS_SHEET)?;
    let (row, col) = grid.find(is_word_count_label)?;
    number_near(grid, row, col)
}

fn is_word_count_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("word count") || lower.contains(WORD_COUNT_CODE)
}

fn word_count_label(workbook: &Workbook) -> Option<u32> {
    let grid = workbook.primary();
    for row in 0..grid.height().min(20) {
        for col in 0..grid.width().min(5) {
            if is_word_count_label(grid.cell(row, col)) {
                if let Some(count) = number_near(grid, row, col) {
                    return Some(count);
                }
            }
        }
    }
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Headings
// ────────────────────────────────────────────────────────────────────────────

const HEADING_STRATEGIES: &[Strategy<HeadingStructure>] = &[
    Strategy {
        name: "headings block",
        run: headings_block,
    },
    Strategy {
        name: "heading tag requirement labels",
        run: headings_from_requirement_labels,
    },
];

/// Heading level named in a label: "Number of H2 tags" → H2.
fn heading_level_in_label(label: &str) -> Option<HeadingLevel> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\bh([2-6])\b").expect("static regex"));
    let depth: usize = re.captures(label)?.get(1)?.as_str().parse().ok()?;
    HeadingLevel::from_depth(depth)
}

/// Rows under a "Headings" label in column A; quota read from column B.
fn headings_block(workbook: &Workbook) -> Option<HeadingStructure> {
    let grid = workbook.primary();
    let start = (0..grid.height())
        .find(|&r| matches!(label_key(grid.cell(r, 0)).as_str(), "headings" | "heading structure"))?
        + 1;

    let mut structure = HeadingStructure::default();
    let mut started = false;
    for row in start..grid.height() {
        let label = grid.cell(row, 0);
        if label.is_empty() {
            if started {
                break;
            }
            continue;
        }
        if phase_number(label).is_some() {
            break;
        }
        started = true;
        let Some(level) = heading_level_in_label(label) else {
            continue;
        };
        if let Some(count) = first_integer(grid.cell(row, 1)) {
            if structure.get(level) == 0 {
                structure.set(level, count);
            }
        }
    }

    (!structure.is_empty()).then_some(structure)
}

fn headings_from_requirement_labels(workbook: &Workbook) -> Option<HeadingStructure> {
    let bag = phase_one_requirements(workbook)?;
    let mut structure = HeadingStructure::default();
    for (label, amount) in &bag {
        if !label.to_lowercase().contains("tag") {
            continue;
        }
        if let Some(level) = heading_level_in_label(label) {
            if structure.get(level) == 0 {
                structure.set(level, *amount);
            }
        }
    }
    (!structure.is_empty()).then_some(structure)
}

/// H2 falls back to 3 and H3 to twice H2 when the report gives nothing.
fn apply_heading_defaults(structure: &mut HeadingStructure) {
    if structure.get(HeadingLevel::H2) == 0 {
        structure.set(HeadingLevel::H2, DEFAULT_H2_COUNT);
    }
    if structure.get(HeadingLevel::H3) == 0 {
        let h2 = structure.get(HeadingLevel::H2);
        structure.set(HeadingLevel::H3, h2.saturating_mul(2));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LSI keywords & entities
// ────────────────────────────────────────────────────────────────────────────

const LSI_STRATEGIES: &[Strategy<LsiSource>] = &[
    Strategy {
        name: "lsi keywords sheet",
        run: lsi_sheet,
    },
    Strategy {
        name: "lsi keywords section",
        run: lsi_section,
    },
];

fn lsi_sheet(workbook: &Workbook) -> Option<LsiSource> {
    lsi_pairs(workbook.sheet(LSI_SHEET)?, 0, 0)
}

fn lsi_section(workbook: &Workbook) -> Option<LsiSource> {
    let grid = workbook.primary();
    let (row, col) = grid.find(|t| label_key(t) == "lsi keywords")?;
    lsi_pairs(grid, row + 1, col)
}

/// (keyword, frequency) pairs from `col` and `col + 1`. Fractional targets
/// round up; a missing or non-numeric frequency counts as 1.
fn lsi_pairs(grid: &Grid, start_row: usize, col: usize) -> Option<LsiSource> {
    let pairs: Vec<(String, u32)> = scan_list(grid, start_row, col, LSI_HEADERS, true)
        .into_iter()
        .map(|row| {
            let keyword = grid.cell(row, col).to_string();
            let target = first_number(grid.cell(row, col + 1))
                .map(|f| f.ceil().max(1.0) as u32)
                .unwrap_or(1);
            (keyword, target)
        })
        .collect();

    (!pairs.is_empty()).then_some(LsiSource::FromMapping(pairs))
}

const ENTITY_STRATEGIES: &[Strategy<Vec<String>>] = &[
    Strategy {
        name: "entity sheet",
        run: entity_sheet,
    },
    Strategy {
        name: "entities section",
        run: entity_section,
    },
];

fn entity_sheet(workbook: &Workbook) -> Option<Vec<String>> {
    ENTITY_SHEETS
        .iter()
        .filter_map(|name| workbook.sheet(name))
        .find_map(|grid| entity_column(grid, 0, 0))
}

fn entity_section(workbook: &Workbook) -> Option<Vec<String>> {
    let grid = workbook.primary();
    let (row, col) = grid.find(|t| label_key(t) == "entities")?;
    entity_column(grid, row + 1, col)
}

fn entity_column(grid: &Grid, start_row: usize, col: usize) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let entities: Vec<String> = scan_list(grid, start_row, col, ENTITY_HEADERS, false)
        .into_iter()
        .map(|row| grid.cell(row, col).to_string())
        .filter(|e| seen.insert(e.to_lowercase()))
        .collect();
    (!entities.is_empty()).then_some(entities)
}
