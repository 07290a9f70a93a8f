//! Extraction strategies and the cell-reading helpers they share.
//!
//! A field is located by an ordered list of strategies; the first one that
//! returns `Some` wins. A field no strategy can find is logged and left to the
//! caller's default.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::report::workbook::{Grid, Workbook};

/// One way of locating a field in a workbook.
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&Workbook) -> Option<T>,
}

/// Evaluates `strategies` in order and returns the first hit.
pub fn first_success<T>(section: &str, workbook: &Workbook, strategies: &[Strategy<T>]) -> Option<T> {
    for strategy in strategies {
        if let Some(value) = (strategy.run)(workbook) {
            debug!("{section}: matched via '{}'", strategy.name);
            return Some(value);
        }
    }
    warn!("{section}: section not found in report, using default");
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Text helpers
// ────────────────────────────────────────────────────────────────────────────

/// First integer in the text, tolerating currency symbols and thousands
/// separators: "$1,850 words" → 1850.
pub fn first_integer(text: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\d[\d,]*").expect("static regex"));
    let digits: String = re
        .find(text)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// First decimal number in the text: "2.4 times" → 2.4.
pub fn first_number(text: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("static regex"));
    re.find(text)?.as_str().replace(',', "").parse().ok()
}

/// Number from a "Phase N" marker row, if the text is one.
pub fn phase_number(text: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)^\s*phase\s*(\d+)").expect("static regex"));
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

pub fn is_phase_marker(text: &str) -> bool {
    phase_number(text).is_some()
}

/// Splits a comma- or pipe-delimited cell, trimming spaces and quotes.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', '|'])
        .map(|part| part.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\''))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text after the first ':' of a "Label: value" cell.
pub fn inline_value(text: &str) -> Option<&str> {
    let (_, value) = text.split_once(':')?;
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Normalized label for header comparisons: lowercase, no trailing colon.
pub fn label_key(text: &str) -> String {
    text.trim().trim_end_matches(':').trim().to_lowercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Grid helpers
// ────────────────────────────────────────────────────────────────────────────

/// Right neighbour, else the cell below, skipping empties and rejected values.
pub fn adjacent_value(
    grid: &Grid,
    row: usize,
    col: usize,
    accept: impl Fn(&str) -> bool,
) -> Option<&str> {
    [(row, col + 1), (row + 1, col)]
        .into_iter()
        .map(|(r, c)| grid.cell(r, c))
        .find(|text| !text.is_empty() && accept(text))
}

/// First positive integer to the right of or below a label cell.
pub fn number_near(grid: &Grid, row: usize, col: usize) -> Option<u32> {
    [(row, col + 1), (row + 1, col)]
        .into_iter()
        .filter_map(|(r, c)| first_integer(grid.cell(r, c)))
        .find(|n| *n > 0)
}

/// Row indices of a single-column list starting at `start_row`.
///
/// Leading blanks and header rows are skipped. The list ends at a blank row
/// once data has started, at a "Phase N" marker, or (when `stop_at_entities`)
/// at a literal "Entities" row.
pub fn scan_list(
    grid: &Grid,
    start_row: usize,
    col: usize,
    headers: &[&str],
    stop_at_entities: bool,
) -> Vec<usize> {
    let mut rows = Vec::new();

    for row in start_row..grid.height() {
        let text = grid.cell(row, col);

        if text.is_empty() {
            if rows.is_empty() {
                continue;
            }
            break;
        }
        if is_phase_marker(text) {
            break;
        }
        let key = label_key(text);
        if stop_at_entities && key == "entities" {
            break;
        }
        if headers.contains(&key.as_str()) || !text.chars().any(char::is_alphabetic) {
            continue;
        }
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::workbook::{grid, Sheet};

    #[test]
    fn test_first_integer_tolerates_noise() {
        assert_eq!(first_integer("$1,850 words"), Some(1850));
        assert_eq!(first_integer("Use 3 H2 tags"), Some(3));
        assert_eq!(first_integer("none"), None);
    }

    #[test]
    fn test_first_number_keeps_fraction() {
        assert_eq!(first_number("2.4"), Some(2.4));
        assert_eq!(first_number("about 1,200.5 times"), Some(1200.5));
        assert_eq!(first_number("n/a"), None);
    }

    #[test]
    fn test_phase_markers() {
        assert_eq!(phase_number("Phase 1: Title & Headings"), Some(1));
        assert_eq!(phase_number("  phase 12"), Some(12));
        assert!(!is_phase_marker("Rephase 2"));
    }

    #[test]
    fn test_split_list_strips_quotes() {
        assert_eq!(
            split_list(r#""hiking boots", 'trail boots' | walking boots,,"#),
            vec!["hiking boots", "trail boots", "walking boots"]
        );
    }

    #[test]
    fn test_inline_value() {
        assert_eq!(inline_value("Primary Keyword: hiking boots"), Some("hiking boots"));
        assert_eq!(inline_value("Primary Keyword:"), None);
        assert_eq!(inline_value("Primary Keyword"), None);
    }

    #[test]
    fn test_adjacent_value_prefers_right() {
        let g = grid(&[&["Label", "right"], &["below", ""]]);
        assert_eq!(adjacent_value(&g, 0, 0, |_| true), Some("right"));
        assert_eq!(adjacent_value(&g, 0, 0, |t| t != "right"), Some("below"));
    }

    #[test]
    fn test_number_near_skips_zero() {
        let g = grid(&[&["Word Count", "0"], &["1,700", ""]]);
        assert_eq!(number_near(&g, 0, 0), Some(1700));
    }

    #[test]
    fn test_scan_list_sentinels() {
        let g = grid(&[
            &["Keyword"],
            &[""],
            &["trail"],
            &["tread"],
            &[""],
            &["after blank"],
        ]);
        assert_eq!(scan_list(&g, 0, 0, &["keyword"], true), vec![2, 3]);

        let g = grid(&[&["trail"], &["Entities"], &["Gore-Tex"]]);
        assert_eq!(scan_list(&g, 0, 0, &[], true), vec![0]);
        assert_eq!(scan_list(&g, 0, 0, &[], false), vec![0, 1, 2]);

        let g = grid(&[&["trail"], &["Phase 2: Content"], &["tread"]]);
        assert_eq!(scan_list(&g, 0, 0, &[], false), vec![0]);
    }

    #[test]
    fn test_first_success_takes_first_hit_in_order() {
        fn miss(_: &Workbook) -> Option<u32> {
            None
        }
        fn hit_one(_: &Workbook) -> Option<u32> {
            Some(1)
        }
        fn hit_two(_: &Workbook) -> Option<u32> {
            Some(2)
        }
        let wb = Workbook::from_sheets(vec![Sheet::new("S", grid(&[]))]);
        let strategies = [
            Strategy { name: "miss", run: miss },
            Strategy { name: "one", run: hit_one },
            Strategy { name: "two", run: hit_two },
        ];
        assert_eq!(first_success("test", &wb, &strategies), Some(1));
        assert_eq!(first_success("test", &wb, &strategies[..1]), None);
    }
}
