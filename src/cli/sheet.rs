use clap::Subcommand;
use gsheets::error::{AppError, Result};
use gsheets::range::CellPos;
use gsheets::sheets::{SheetOperations, Spreadsheet};
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum SheetAction {
    /// Print a tab's contents as tab-separated text
    Dump { spreadsheet_id: String, sheet: String },
    /// Print the range a tab's data occupies
    Range { spreadsheet_id: String, sheet: String },
    /// Write a CSV/TSV file into a tab
    Write {
        spreadsheet_id: String,
        sheet: String,
        file: PathBuf,
        /// Top-left cell to write at
        #[arg(long, default_value = "A1")]
        at: CellPos,
        #[arg(long)]
        delimiter: Option<char>,
    },
    /// Add a tab (no-op if it exists)
    Add { spreadsheet_id: String, title: String },
    /// Copy a tab to a new tab at the end
    Duplicate {
        spreadsheet_id: String,
        title: String,
        new_title: String,
    },
}

impl SheetAction {
    pub async fn execute(&self) -> Result<()> {
        let client = super::connect().await?;

        match self {
            SheetAction::Dump {
                spreadsheet_id,
                sheet,
            } => {
                let spreadsheet = client.get_spreadsheet_with_data(spreadsheet_id).await?;
                for row in find_sheet(&spreadsheet, sheet)?.contents()? {
                    println!("{}", row.join("\t"));
                }
            }
            SheetAction::Range {
                spreadsheet_id,
                sheet,
            } => {
                let spreadsheet = client.get_spreadsheet_with_data(spreadsheet_id).await?;
                let sheet = find_sheet(&spreadsheet, sheet)?;
                let range = sheet.occupied_range()?;
                println!("{}", gsheets::range::format_range(sheet.title(), range));
            }
            SheetAction::Write {
                spreadsheet_id,
                sheet,
                file,
                at,
                delimiter,
            } => {
                let data = super::read_table(file, *delimiter)?;
                let spreadsheet = client.get_spreadsheet(spreadsheet_id).await?;
                let sheet = find_sheet(&spreadsheet, sheet)?;
                let range = client
                    .update_sheet(spreadsheet.id(), sheet.title(), *at, &data)
                    .await?;
                info!(range = %range, "Wrote data");
            }
            SheetAction::Add {
                spreadsheet_id,
                title,
            } => {
                let mut spreadsheet = client.get_spreadsheet(spreadsheet_id).await?;
                let sheet = client.add_sheet(&mut spreadsheet, title).await?;
                info!(title = sheet.title(), sheet_id = ?sheet.sheet_id(), "Sheet ready");
            }
            SheetAction::Duplicate {
                spreadsheet_id,
                title,
                new_title,
            } => {
                let mut spreadsheet = client.get_spreadsheet(spreadsheet_id).await?;
                let sheet = client
                    .duplicate_sheet(&mut spreadsheet, title, new_title)
                    .await?;
                info!(title = sheet.title(), sheet_id = ?sheet.sheet_id(), "Duplicated sheet");
            }
        }

        Ok(())
    }
}

fn find_sheet(spreadsheet: &Spreadsheet, title: &str) -> Result<gsheets::sheets::Sheet> {
    spreadsheet.get_sheet(title).ok_or_else(|| {
        AppError::Sheets(format!(
            "Sheet '{}' not found in {}",
            title,
            spreadsheet.id()
        ))
    })
}
