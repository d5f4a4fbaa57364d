//! A1-notation addressing for blocks of cell values.
//!
//! Positions are zero-based internally and rendered the way the Sheets API
//! expects them: base-26 column letters followed by a 1-based row number,
//! e.g. `Sheet1!A1:C10`.

use crate::error::{AppError, Result};
use google_sheets4::api::{CellData, GridData};
use std::fmt;
use std::str::FromStr;

/// Widest sheet the Sheets API allows (column `ZZZ`).
pub const MAX_COLUMNS: u32 = 18278;

/// A single cell, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

impl CellPos {
    pub const TOP_LEFT: CellPos = CellPos { row: 0, col: 0 };

    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Range covered by `data` when written with its first cell at `self`.
    ///
    /// Rows may have different lengths; the widest row decides the width.
    /// Empty data yields the single cell at `self`.
    pub fn range_for_data<T>(self, data: &[Vec<T>]) -> CellRange {
        let height = data.len() as u32;
        let width = data
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0) as u32;

        CellRange {
            start: self,
            end: CellPos {
                row: self.row.saturating_add(height.saturating_sub(1)),
                col: self.col.saturating_add(width.saturating_sub(1)),
            },
        }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), u64::from(self.row) + 1)
    }
}

impl FromStr for CellPos {
    type Err = AppError;

    /// Parse an A1 reference such as `C12` (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::Range(format!("'{}' is not an A1 cell reference", s));

        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = s.split_at(split);

        let col = column_index(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(CellPos { row: row - 1, col })
    }
}

/// Inclusive rectangle of cells. `end` is never above or left of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    start: CellPos,
    end: CellPos,
}

impl CellRange {
    pub fn new(start: CellPos, end: CellPos) -> Result<Self> {
        if end.row < start.row || end.col < start.col {
            return Err(AppError::Range(format!(
                "end {} lies before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(pos: CellPos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn start(&self) -> CellPos {
        self.start
    }

    pub fn end(&self) -> CellPos {
        self.end
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// A cell range qualified by the sheet it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet_name: String,
    pub range: CellRange,
}

impl SheetRange {
    pub fn new(sheet_name: impl Into<String>, range: CellRange) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            range,
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet_name, self.range)
    }
}

/// Range of `data` anchored at `anchor`.
pub fn range_for_data<T>(anchor: CellPos, data: &[Vec<T>]) -> CellRange {
    anchor.range_for_data(data)
}

/// Render `range` on `sheet_name` as `Sheet!A1:B2`.
pub fn format_range(sheet_name: &str, range: CellRange) -> String {
    SheetRange::new(sheet_name, range).to_string()
}

/// Column letters for a zero-based column index: 0 → A, 25 → Z, 26 → AA.
pub fn column_letters(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Zero-based column index for letters such as `AA`; `None` if not letters.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut index: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let value = u64::from(c.to_ascii_uppercase() as u8 - b'A' + 1);
        index = index * 26 + value;
        if index > u64::from(u32::MAX) {
            return None;
        }
    }

    u32::try_from(index - 1).ok()
}

/// Rectangle from A1 covering everything present in fetched grid data.
///
/// The last row is the last one carrying any cells, the last column is the
/// rightmost cell holding a value in any row. An empty grid yields A1:A1.
pub fn occupied_rectangle(grid: &GridData) -> CellRange {
    let mut end = CellPos::TOP_LEFT;

    for (row_idx, row) in grid.row_data.as_deref().unwrap_or_default().iter().enumerate() {
        let cells = row.values.as_deref().unwrap_or_default();
        if cells.is_empty() {
            continue;
        }

        end.row = row_idx as u32;
        if let Some(col_idx) = cells.iter().rposition(has_value) {
            end.col = end.col.max(col_idx as u32);
        }
    }

    CellRange {
        start: CellPos::TOP_LEFT,
        end,
    }
}

fn has_value(cell: &CellData) -> bool {
    cell.effective_value.is_some()
        || cell.user_entered_value.is_some()
        || cell.formatted_value.is_some()
}


#[cfg(test)]
mod tests {
    use super::*;
    use google_sheets4::api::RowData;

    fn rows(widths: &[usize]) -> Vec<Vec<String>> {
        widths
            .iter()
            .map(|&w| (0..w).map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(51), "AZ");
        assert_eq!(column_letters(52), "BA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
        assert_eq!(column_letters(MAX_COLUMNS - 1), "ZZZ");
    }

    #[test]
    fn test_column_index() {
        for col in [0, 25, 26, 701, 702, MAX_COLUMNS - 1] {
            assert_eq!(column_index(&column_letters(col)), Some(col));
        }
        assert_eq!(column_index("aa"), Some(26));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_range_for_data() {
        let anchor = CellPos::new(3, 2);
        let data = rows(&[4, 4, 4]);

        let range = anchor.range_for_data(&data);
        assert_eq!(range.start(), anchor);
        assert_eq!(range.end(), CellPos::new(5, 5));
        assert_eq!(range.height(), 3);
        assert_eq!(range.width(), 4);
    }

    #[test]
    fn test_range_for_data_ragged_rows() {
        let data = rows(&[1, 7, 2]);
        let range = range_for_data(CellPos::TOP_LEFT, &data);

        assert_eq!(range.height(), 3);
        assert_eq!(range.width(), 7, "widest row decides the width");
    }

    #[test]
    fn test_range_for_data_empty() {
        let anchor = CellPos::new(9, 4);
        let data: Vec<Vec<String>> = vec![];

        assert_eq!(anchor.range_for_data(&data), CellRange::single(anchor));
    }

    #[test]
    fn test_format_range() {
        let data = rows(&[3; 10]);
        let range = CellPos::TOP_LEFT.range_for_data(&data);
        assert_eq!(format_range("Sheet1", range), "Sheet1!A1:C10");

        let range = CellPos::new(0, 700).range_for_data(&rows(&[3]));
        assert_eq!(format_range("Wide", range), "Wide!ZY1:AAA1");
    }

    #[test]
    fn test_cell_range_rejects_inverted() {
        let result = CellRange::new(CellPos::new(2, 2), CellPos::new(1, 3));
        assert!(matches!(result, Err(AppError::Range(_))));

        let range = CellRange::new(CellPos::new(1, 1), CellPos::new(1, 1)).unwrap();
        assert_eq!(range, CellRange::single(CellPos::new(1, 1)));
    }

    #[test]
    fn test_parse_cell_pos() {
        assert_eq!("A1".parse::<CellPos>().unwrap(), CellPos::TOP_LEFT);
        assert_eq!("c12".parse::<CellPos>().unwrap(), CellPos::new(11, 2));
        assert_eq!("AA3".parse::<CellPos>().unwrap(), CellPos::new(2, 26));
        assert_eq!(CellPos::new(11, 2).to_string(), "C12");

        for bad in ["", "12", "A", "A0", "1A", "A-1"] {
            assert!(bad.parse::<CellPos>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_occupied_rectangle_ragged() {
        let grid = test_helpers::mock_grid(&[3, 5, 2]);
        let range = occupied_rectangle(&grid);

        assert_eq!(range.start(), CellPos::TOP_LEFT);
        assert_eq!(range.end(), CellPos::new(2, 4));
        assert_eq!(range.width(), 5);
    }

    #[test]
    fn test_occupied_rectangle_empty() {
        let range = occupied_rectangle(&GridData::default());
        assert_eq!(range, CellRange::single(CellPos::TOP_LEFT));

        let grid = GridData {
            row_data: Some(vec![RowData::default(), RowData::default()]),
            ..Default::default()
        };
        assert_eq!(occupied_rectangle(&grid), CellRange::single(CellPos::TOP_LEFT));
    }

    #[test]
    fn test_occupied_rectangle_ignores_trailing_blank_cells() {
        let grid = GridData {
            row_data: Some(vec![
                RowData {
                    values: Some(vec![
                        test_helpers::value_cell("a"),
                        test_helpers::value_cell("b"),
                        CellData::default(),
                        CellData::default(),
                    ]),
                },
                RowData { values: None },
            ]),
            ..Default::default()
        };

        let range = occupied_rectangle(&grid);
        assert_eq!(range.end(), CellPos::new(0, 1));
    }
}
