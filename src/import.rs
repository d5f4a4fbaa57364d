use crate::error::{AppError, Result};
use crate::sheets::{DriveOperations, SheetOperations, Spreadsheet};
use crate::tabular::TabularData;
use indicatif::ProgressStyle;
use tracing::{Span, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Who gets access to an imported spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct Sharing {
    pub recipients: Vec<String>,
    /// Send Drive's notification email to each recipient.
    pub notify: bool,
    /// Anyone with the link can edit.
    pub anyone: bool,
    /// Hand ownership to this user once everything else is done.
    pub owner: Option<String>,
}

impl Sharing {
    fn steps(&self) -> u64 {
        self.recipients.len() as u64 + u64::from(self.anyone) + u64::from(self.owner.is_some())
    }
}

/// Creates a spreadsheet from tabular data and shares it.
pub struct Importer<C> {
    client: C,
    sharing: Sharing,
}

impl<C> Importer<C>
where
    C: SheetOperations + DriveOperations,
{
    pub fn new(client: C, sharing: Sharing) -> Self {
        Self { client, sharing }
    }

    #[instrument(name = "Importing", skip(self, data), fields(rows = data.len()))]
    pub async fn import(&self, title: &str, data: &TabularData) -> Result<Spreadsheet> {
        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .map_err(|e| AppError::Other(e.into()))?,
        );
        span.pb_set_length(1 + self.sharing.steps());

        span.pb_set_message("Creating spreadsheet");
        let spreadsheet = self
            .client
            .create_spreadsheet_with_data(title, data)
            .await?;
        span.pb_inc(1);

        let file_id = spreadsheet.id();

        for email in &self.sharing.recipients {
            span.pb_set_message(&format!("Sharing with {}", email));
            self.client
                .share_file(file_id, email, self.sharing.notify)
                .await?;
            span.pb_inc(1);
        }

        if self.sharing.anyone {
            span.pb_set_message("Sharing with anyone");
            self.client.share_with_anyone(file_id).await?;
            span.pb_inc(1);
        }

        if let Some(owner) = &self.sharing.owner {
            span.pb_set_message(&format!("Transferring ownership to {}", owner));
            self.client.transfer_ownership(file_id, owner).await?;
            span.pb_inc(1);
        }

        info!(id = file_id, url = spreadsheet.url(), "Spreadsheet imported");

        Ok(spreadsheet)
    }
}

#[cfg(test)]
pub(crate) mod mocks {
    use crate::error::{AppError, Result};
    use crate::range::{CellPos, SheetRange};
    use crate::sheets::test_helpers::{mock_sheet, mock_spreadsheet};
    use crate::sheets::{DriveOperations, SheetOperations, Sheet, Spreadsheet};
    use async_trait::async_trait;
    use google_drive3::api::File;
    use std::sync::{Arc, Mutex};

    pub(crate) const MOCK_SPREADSHEET_ID: &str = "ss_123";

    /// Records every call so tests can assert on order and arguments.
    #[derive(Clone, Default)]
    pub(crate) struct MockClient {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub written: Arc<Mutex<Vec<(String, CellPos, Vec<Vec<String>>)>>>,
        pub fail_share_for: Option<String>,
        pub default_sheet_missing: bool,
        /// Tabs beyond Sheet1 that a fetch finds on the server.
        pub remote_sheets: Vec<String>,
    }

    impl MockClient {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl SheetOperations for MockClient {
        async fn create_spreadsheet(&self, title: &str) -> Result<Spreadsheet> {
            self.record(format!("create {}", title));
            let sheets = match self.default_sheet_missing {
                true => vec![],
                false => vec![mock_sheet("Sheet1", 0, 0)],
            };
            Ok(mock_spreadsheet(MOCK_SPREADSHEET_ID, sheets))
        }

        async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
            self.record(format!("get {}", spreadsheet_id));
            let mut sheets = vec![mock_sheet("Sheet1", 0, 0)];
            for (i, title) in (1..).zip(&self.remote_sheets) {
                sheets.push(mock_sheet(title, 100 + i, i));
            }
            Ok(mock_spreadsheet(spreadsheet_id, sheets))
        }

        async fn get_spreadsheet_with_data(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
            self.get_spreadsheet(spreadsheet_id).await
        }

        async fn update_sheet(
            &self,
            spreadsheet_id: &str,
            sheet_title: &str,
            anchor: CellPos,
            data: &[Vec<String>],
        ) -> Result<SheetRange> {
            let range = SheetRange::new(sheet_title, anchor.range_for_data(data));
            self.record(format!("update {} {}", spreadsheet_id, range));
            self.written
                .lock()
                .unwrap()
                .push((sheet_title.to_string(), anchor, data.to_vec()));
            Ok(range)
        }

        async fn add_sheet(&self, spreadsheet: &mut Spreadsheet, title: &str) -> Result<Sheet> {
            self.record(format!("add_sheet {}", title));
            spreadsheet
                .get_sheet(title)
                .ok_or_else(|| AppError::Sheets("not supported by mock".to_string()))
        }

        async fn duplicate_sheet(
            &self,
            _spreadsheet: &mut Spreadsheet,
            title: &str,
            new_title: &str,
        ) -> Result<Sheet> {
            self.record(format!("duplicate_sheet {} {}", title, new_title));
            Err(AppError::Sheets("not supported by mock".to_string()))
        }
    }

    #[async_trait]
    impl DriveOperations for MockClient {
        async fn list_files(&self, query: &str) -> Result<Vec<File>> {
            self.record(format!("list {}", query));
            Ok(vec![])
        }

        async fn copy_file(&self, file_id: &str, new_name: &str) -> Result<File> {
            self.record(format!("copy {} {}", file_id, new_name));
            Ok(File::default())
        }

        async fn delete_file(&self, file_id: &str) -> Result<()> {
            self.record(format!("delete {}", file_id));
            Ok(())
        }

        async fn share_file(&self, file_id: &str, email: &str, notify: bool) -> Result<()> {
            self.record(format!("share {} {} notify={}", file_id, email, notify));
            if self.fail_share_for.as_deref() == Some(email) {
                return Err(AppError::Drive(format!("cannot share with {}", email)));
            }
            Ok(())
        }

        async fn share_with_anyone(&self, file_id: &str) -> Result<()> {
            self.record(format!("share_anyone {}", file_id));
            Ok(())
        }

        async fn revoke(&self, file_id: &str, email: &str) -> Result<bool> {
            self.record(format!("revoke {} {}", file_id, email));
            Ok(false)
        }

        async fn transfer_ownership(&self, file_id: &str, email: &str) -> Result<()> {
            self.record(format!("transfer {} {}", file_id, email));
            Ok(())
        }
    }
}
