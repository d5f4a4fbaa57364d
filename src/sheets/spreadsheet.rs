use crate::error::{AppError, Result};
use crate::range::{CellPos, CellRange, occupied_rectangle};
use crate::tabular::TabularData;
use google_sheets4::api;

/// A fetched spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct Spreadsheet {
    inner: api::Spreadsheet,
}

impl Spreadsheet {
    pub fn new(inner: api::Spreadsheet) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> &str {
        self.inner.spreadsheet_id.as_deref().unwrap_or_default()
    }

    pub fn url(&self) -> &str {
        self.inner.spreadsheet_url.as_deref().unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.inner
            .properties
            .as_ref()
            .and_then(|p| p.title.as_deref())
            .unwrap_or_default()
    }

    pub fn sheets(&self) -> impl Iterator<Item = Sheet> + '_ {
        self.inner
            .sheets
            .as_deref()
            .unwrap_or_default()
            .iter()
            .cloned()
            .map(Sheet::new)
    }

    /// Find a sheet by title, ignoring ASCII case.
    pub fn get_sheet(&self, title: &str) -> Option<Sheet> {
        self.sheets().find(|sheet| sheet.title().eq_ignore_ascii_case(title))
    }

    /// Index one past the last sheet, i.e. the position of a new trailing tab.
    pub fn next_sheet_index(&self) -> i32 {
        self.sheets()
            .filter_map(|sheet| sheet.index())
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Replace the cached state, e.g. with the spreadsheet returned by a batch update.
    pub(crate) fn refresh(&mut self, inner: api::Spreadsheet) {
        self.inner = inner;
    }
}

/// One tab of a spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    inner: api::Sheet,
}

impl Sheet {
    pub fn new(inner: api::Sheet) -> Self {
        Self { inner }
    }

    pub fn title(&self) -> &str {
        self.properties()
            .and_then(|p| p.title.as_deref())
            .unwrap_or_default()
    }

    pub fn sheet_id(&self) -> Option<i32> {
        self.properties().and_then(|p| p.sheet_id)
    }

    pub fn index(&self) -> Option<i32> {
        self.properties().and_then(|p| p.index)
    }

    pub fn top_left(&self) -> CellPos {
        CellPos::TOP_LEFT
    }

    fn properties(&self) -> Option<&api::SheetProperties> {
        self.inner.properties.as_ref()
    }

    fn grid(&self) -> Result<&api::GridData> {
        self.inner
            .data
            .as_deref()
            .and_then(|data| data.first())
            .ok_or_else(|| {
                AppError::Sheets(format!(
                    "Sheet '{}' has no grid data, fetch it with grid data first",
                    self.title()
                ))
            })
    }

    /// Cell values as strings. Blank cells become empty strings; rows keep
    /// the length the API returned them with.
    pub fn contents(&self) -> Result<TabularData> {
        let rows = self
            .grid()?
            .row_data
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|row| {
                row.values
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(cell_text)
                    .collect()
            })
            .collect();

        Ok(rows)
    }

    /// Rectangle from A1 covering the fetched data.
    pub fn occupied_range(&self) -> Result<CellRange> {
        Ok(occupied_rectangle(self.grid()?))
    }
}

fn cell_text(cell: &api::CellData) -> String {
    if let Some(formatted) = &cell.formatted_value {
        return formatted.clone();
    }

    cell.effective_value
        .as_ref()
        .and_then(|value| value.string_value.clone())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::test_helpers::{mock_sheet, mock_spreadsheet};
    use super::*;
    use crate::range::test_helpers::{mock_grid, value_cell};

    #[test]
    fn test_get_sheet_ignores_case() {
        let ss = mock_spreadsheet(
            "ss_1",
            vec![mock_sheet("Sheet1", 0, 0), mock_sheet("Budget", 42, 1)],
        );

        let sheet = ss.get_sheet("BUDGET").unwrap();
        assert_eq!(sheet.title(), "Budget");
        assert_eq!(sheet.sheet_id(), Some(42));
        assert!(ss.get_sheet("missing").is_none());
    }

    #[test]
    fn test_spreadsheet_title() {
        let ss = Spreadsheet::new(api::Spreadsheet {
            properties: Some(api::SpreadsheetProperties {
                title: Some("Inventory".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(ss.title(), "Inventory");
        assert_eq!(mock_spreadsheet("ss_1", vec![]).title(), "");
    }

    #[test]
    fn test_next_sheet_index() {
        let ss = mock_spreadsheet(
            "ss_1",
            vec![mock_sheet("A", 1, 0), mock_sheet("B", 2, 3), mock_sheet("C", 3, 1)],
        );
        assert_eq!(ss.next_sheet_index(), 4);

        assert_eq!(mock_spreadsheet("ss_2", vec![]).next_sheet_index(), 0);
    }

    #[test]
    fn test_contents_requires_grid_data() {
        let sheet = Sheet::new(mock_sheet("Sheet1", 0, 0));
        assert!(matches!(sheet.contents(), Err(AppError::Sheets(_))));
        assert!(sheet.occupied_range().is_err());
    }

    #[test]
    fn test_contents() {
        let mut raw = mock_sheet("Sheet1", 0, 0);
        let mut grid = mock_grid(&[2, 1]);
        if let Some(rows) = grid.row_data.as_mut() {
            rows[1].values = Some(vec![
                api::CellData {
                    effective_value: Some(api::ExtendedValue {
                        string_value: Some("from effective".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                api::CellData::default(),
                value_cell("shown"),
            ]);
        }
        raw.data = Some(vec![grid]);

        let sheet = Sheet::new(raw);
        assert_eq!(
            sheet.contents().unwrap(),
            vec![
                vec!["r0c0", "r0c1"],
                vec!["from effective", "", "shown"],
            ]
        );
        assert_eq!(sheet.occupied_range().unwrap().end(), CellPos::new(1, 2));
    }
}
