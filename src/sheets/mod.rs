mod auth;
mod client;
mod spreadsheet;

pub use auth::clear_tokens;
pub use client::SheetsClient;
pub use spreadsheet::{Sheet, Spreadsheet};

#[cfg(test)]
pub(crate) use spreadsheet::test_helpers;

use crate::error::{AppError, Result};
use crate::range::{CellPos, SheetRange};
use crate::retry::{CreateVerdict, ErrorKind, create_verdict};
use async_trait::async_trait;
use google_drive3::api::File;
use tracing::warn;

/// Title of the tab every new spreadsheet starts with.
pub const DEFAULT_SHEET: &str = "Sheet1";

#[async_trait]
pub trait SheetOperations: Send + Sync {
    async fn create_spreadsheet(&self, title: &str) -> Result<Spreadsheet>;

    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet>;

    /// Fetch including cell data, needed for [`Sheet::contents`].
    async fn get_spreadsheet_with_data(&self, spreadsheet_id: &str) -> Result<Spreadsheet>;

    /// Write `data` with its first cell at `anchor`; returns the range written.
    async fn update_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_title: &str,
        anchor: CellPos,
        data: &[Vec<String>],
    ) -> Result<SheetRange>;

    /// Add a tab, or return the existing one with that title.
    async fn add_sheet(&self, spreadsheet: &mut Spreadsheet, title: &str) -> Result<Sheet>;

    /// Copy tab `title` to a new tab `new_title` placed after the last one.
    async fn duplicate_sheet(
        &self,
        spreadsheet: &mut Spreadsheet,
        title: &str,
        new_title: &str,
    ) -> Result<Sheet>;

    async fn create_spreadsheet_with_data(
        &self,
        title: &str,
        data: &[Vec<String>],
    ) -> Result<Spreadsheet> {
        let spreadsheet = self.create_spreadsheet(title).await?;

        let sheet = spreadsheet.get_sheet(DEFAULT_SHEET).ok_or_else(|| {
            AppError::Sheets(format!(
                "Couldn't find sheet {} for {}",
                DEFAULT_SHEET,
                spreadsheet.id()
            ))
        })?;
        self.update_sheet(spreadsheet.id(), sheet.title(), sheet.top_left(), data)
            .await?;

        Ok(spreadsheet)
    }

    /// Settle a failed request that should have created sheet `title`.
    ///
    /// `history` holds the classified error of every attempt. When an earlier
    /// attempt created the sheet before its response was lost, the
    /// spreadsheet is re-fetched and the sheet returned; otherwise `failure`
    /// is returned unchanged.
    async fn recover_created_sheet(
        &self,
        spreadsheet: &mut Spreadsheet,
        title: &str,
        history: &[ErrorKind],
        failure: AppError,
    ) -> Result<Sheet> {
        if create_verdict(history) != CreateVerdict::DisguisedSuccess {
            return Err(failure);
        }

        warn!(
            sheet = title,
            attempts = history.len(),
            "Sheet was created by an earlier attempt, refreshing spreadsheet"
        );
        let id = spreadsheet.id().to_string();
        *spreadsheet = self.get_spreadsheet(&id).await?;

        spreadsheet
            .get_sheet(title)
            .ok_or_else(|| missing_created_sheet(title))
    }
}

pub(crate) fn missing_created_sheet(title: &str) -> AppError {
    AppError::Sheets(format!("Unable to get sheet after adding it: {}", title))
}

#[async_trait]
pub trait DriveOperations: Send + Sync {
    async fn list_files(&self, query: &str) -> Result<Vec<File>>;

    async fn copy_file(&self, file_id: &str, new_name: &str) -> Result<File>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;

    /// Grant `email` write access, optionally sending a notification email.
    async fn share_file(&self, file_id: &str, email: &str, notify: bool) -> Result<()>;

    /// Anyone with the link can edit; the file is not discoverable.
    async fn share_with_anyone(&self, file_id: &str) -> Result<()>;

    /// Remove the permission held by `email`. Returns whether one was found.
    async fn revoke(&self, file_id: &str, email: &str) -> Result<bool>;

    async fn transfer_ownership(&self, file_id: &str, email: &str) -> Result<()>;
}
