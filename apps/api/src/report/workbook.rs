//! In-memory view of an uploaded workbook.
//!
//! Every sheet becomes a grid of trimmed, stringified cells anchored at A1, so
//! fixed coordinates (e.g. "row 0, column 1") mean the same thing regardless of
//! where the sheet's used range starts.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed report: {0}")]
    MalformedReport(String),
}

static EMPTY_GRID: Grid = Grid { rows: Vec::new() };

/// A sheet's cells as text. Out-of-range reads return "".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.trim().to_string()).collect())
            .collect();
        Self { rows }
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Row-major search of the top-left `max_rows` × `max_cols` window.
    pub fn find_in_window(
        &self,
        max_rows: usize,
        max_cols: usize,
        predicate: impl Fn(&str) -> bool,
    ) -> Option<(usize, usize)> {
        for row in 0..self.height().min(max_rows) {
            for col in 0..self.width().min(max_cols) {
                let text = self.cell(row, col);
                if !text.is_empty() && predicate(text) {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// Row-major search of the whole grid.
    pub fn find(&self, predicate: impl Fn(&str) -> bool) -> Option<(usize, usize)> {
        self.find_in_window(usize::MAX, usize::MAX, predicate)
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

impl Sheet {
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Opens xlsx/xls/xlsb/ods bytes. Fails only when the container itself
    /// cannot be read; unreadable individual sheets are skipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::MalformedReport("file is empty".to_string()));
        }

        let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ExtractError::MalformedReport(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in reader.sheet_names() {
            match reader.worksheet_range(&name) {
                Ok(range) => {
                    let grid = grid_from_range(&range);
                    debug!(
                        "Loaded sheet '{}' ({} rows x {} cols)",
                        name,
                        grid.height(),
                        grid.width()
                    );
                    sheets.push(Sheet::new(name, grid));
                }
                Err(e) => warn!("Skipping unreadable sheet '{name}': {e}"),
            }
        }

        Ok(Self { sheets })
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// The label-oriented data sheet: the first sheet in the workbook.
    pub fn primary(&self) -> &Grid {
        self.sheets.first().map(|s| &s.grid).unwrap_or(&EMPTY_GRID)
    }

    /// Looks a sheet up by name, ignoring case and surrounding whitespace.
    pub fn sheet(&self, name: &str) -> Option<&Grid> {
        self.sheets
            .iter()
            .find(|s| s.name.trim().eq_ignore_ascii_case(name.trim()))
            .map(|s| &s.grid)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

fn grid_from_range(range: &Range<Data>) -> Grid {
    let Some((start_row, start_col)) = range.start() else {
        return Grid::default();
    };

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    Grid::new(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Whole floats print without a fractional part (1500.0 → "1500").
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Builds a grid from string literals. Test helper shared by the extraction tests.
#[cfg(test)]
pub fn grid(rows: &[&[&str]]) -> Grid {
    Grid::new(
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let g = grid(&[&["a", "b"], &["c"]]);
        assert_eq!(g.cell(0, 1), "b");
        assert_eq!(g.cell(1, 1), "");
        assert_eq!(g.cell(9, 9), "");
        assert_eq!(g.width(), 2);
        assert_eq!(g.height(), 2);
    }

    #[test]
    fn test_cells_are_trimmed() {
        let g = grid(&[&["  padded  "]]);
        assert_eq!(g.cell(0, 0), "padded");
    }

    #[test]
    fn test_find_in_window_is_row_major_and_bounded() {
        let g = grid(&[&["", "", "", "target"], &["target", "", "", ""]]);
        assert_eq!(g.find_in_window(5, 3, |t| t == "target"), Some((1, 0)));
        assert_eq!(g.find_in_window(1, 3, |t| t == "target"), None);
        assert_eq!(g.find(|t| t == "target"), Some((0, 3)));
    }

    #[test]
    fn test_sheet_lookup_ignores_case() {
        let wb = Workbook::from_sheets(vec![
            Sheet::new("Roadmap", grid(&[&["x"]])),
            Sheet::new(" LSI Keywords ", grid(&[&["y"]])),
        ]);
        assert_eq!(wb.primary().cell(0, 0), "x");
        assert_eq!(wb.sheet("lsi keywords").map(|g| g.cell(0, 0)), Some("y"));
        assert!(wb.sheet("Entities").is_none());
    }

    #[test]
    fn test_empty_workbook_has_empty_primary() {
        let wb = Workbook::default();
        assert_eq!(wb.primary().height(), 0);
        assert!(wb.sheet_names().is_empty());
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        let err = Workbook::from_bytes(b"definitely not a spreadsheet").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedReport(_)));
    }

    #[test]
    fn test_empty_bytes_are_malformed() {
        assert!(Workbook::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_grid_from_range_anchors_at_a1() {
        let mut range: Range<Data> = Range::new((2, 1), (2, 2));
        range.set_value((2, 1), Data::String("Word Count".into()));
        range.set_value((2, 2), Data::Float(1800.0));
        let g = grid_from_range(&range);
        assert_eq!(g.cell(2, 1), "Word Count");
        assert_eq!(g.cell(2, 2), "1800");
        assert_eq!(g.cell(0, 0), "");
    }
}
