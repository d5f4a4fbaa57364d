use super::{DriveOperations, SheetOperations, Sheet, Spreadsheet, missing_created_sheet};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::range::{CellPos, SheetRange};
use crate::retry::{RetryError, RetryPolicy, TokioSleeper, classify, run_with_retry};
use crate::sheets::auth::create_and_verify_authenticator;
use async_trait::async_trait;
use google_drive3::api::{DriveHub, File, Permission};
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, BatchUpdateSpreadsheetResponse,
    DuplicateSheetRequest, Request, Scope, SheetProperties, Sheets, SpreadsheetProperties,
    ValueRange,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use std::future::Future;
use tracing::{debug, info, instrument};

// Full Drive access covers spreadsheets and sharing of files the app did not create
pub(crate) const AUTH_SCOPE: Scope = Scope::Drive;

const FILE_LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";
const PERMISSION_LIST_FIELDS: &str = "nextPageToken, permissions(id, emailAddress, type, role)";

const QUOTA_USER_PARAM: &str = "quotaUser";

type Connector = HttpsConnector<HttpConnector>;
type ApiError = google_sheets4::Error;

/// Scope and per-call options every request carries.
macro_rules! with_call_options {
    ($client:expr, $call:expr) => {{
        let call = $call.add_scope(AUTH_SCOPE);
        match $client.quota_user.as_deref() {
            Some(quota_user) => call.param(QUOTA_USER_PARAM, quota_user),
            None => call,
        }
    }};
}

pub struct SheetsClient {
    sheets: Sheets<Connector>,
    drive: DriveHub<Connector>,
    policy: RetryPolicy,
    sleeper: TokioSleeper,
    quota_user: Option<String>,
}

impl SheetsClient {
    /// Create a new SheetsClient with authenticated access
    #[instrument(name = "Authenticating to Google", skip_all)]
    pub async fn new(config: &Config) -> Result<Self> {
        let auth = create_and_verify_authenticator(&config.google).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| AppError::Auth(format!("Failed to load native root certificates: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        Ok(Self {
            sheets: Sheets::new(client.clone(), auth.clone()),
            drive: DriveHub::new(client, auth),
            policy: config.retry_policy(),
            sleeper: TokioSleeper,
            quota_user: config.google.quota_user.clone(),
        })
    }

    /// Run one API call under the retry policy, keeping every attempt's error.
    async fn attempt<T, F, Fut>(&self, op: F) -> std::result::Result<T, RetryError<ApiError>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        run_with_retry(
            &self.policy,
            &self.sleeper,
            |e| classify(e).is_retryable(),
            op,
        )
        .await
    }

    async fn call<T, F, Fut>(&self, context: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        self.attempt(op).await.map_err(|e| api_error(context, &e))
    }

    /// Apply `requests` and refresh `spreadsheet` from the response.
    #[instrument(name = "Batch updating spreadsheet", skip_all, fields(id = spreadsheet.id()))]
    pub async fn batch_update(
        &self,
        spreadsheet: &mut Spreadsheet,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateSpreadsheetResponse> {
        let id = spreadsheet.id().to_string();
        let mut response = self
            .try_batch_update(&id, requests)
            .await
            .map_err(|e| api_error("Batch update", &e))?;

        if let Some(updated) = response.updated_spreadsheet.take() {
            spreadsheet.refresh(updated);
        }
        Ok(response)
    }

    async fn try_batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> std::result::Result<BatchUpdateSpreadsheetResponse, RetryError<ApiError>> {
        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            include_spreadsheet_in_response: Some(true),
            response_include_grid_data: Some(false),
            ..Default::default()
        };

        let (_, response) = self
            .attempt(|| {
                let call = self
                    .sheets
                    .spreadsheets()
                    .batch_update(batch_update.clone(), spreadsheet_id);
                with_call_options!(self, call).doit()
            })
            .await?;
        Ok(response)
    }

    /// Run a request that creates sheet `title`, recovering when a retried
    /// attempt reports the sheet an earlier attempt already created.
    async fn create_sheet_with(
        &self,
        spreadsheet: &mut Spreadsheet,
        request: Request,
        title: &str,
        context: &str,
    ) -> Result<Sheet> {
        let id = spreadsheet.id().to_string();
        let (history, failure) = match self.try_batch_update(&id, vec![request]).await {
            Ok(response) => {
                if let Some(updated) = response.updated_spreadsheet {
                    spreadsheet.refresh(updated);
                }
                return spreadsheet
                    .get_sheet(title)
                    .ok_or_else(|| missing_created_sheet(title));
            }
            Err(err) => (
                err.history().map(classify).collect::<Vec<_>>(),
                api_error(context, &err),
            ),
        };

        self.recover_created_sheet(spreadsheet, title, &history, failure)
            .await
    }

    /// Copy a spreadsheet file and fetch the copy.
    pub async fn copy_spreadsheet_from(&self, file_id: &str, new_name: &str) -> Result<Spreadsheet> {
        let file = self.copy_file(file_id, new_name).await?;
        let id = file
            .id
            .ok_or_else(|| AppError::Drive("Copied file has empty ID".to_string()))?;
        self.get_spreadsheet(&id).await
    }
}

fn api_error(context: &str, err: &RetryError<ApiError>) -> AppError {
    AppError::Api {
        context: context.to_string(),
        attempts: err.attempts(),
        kind: classify(err.last()),
    }
}

#[async_trait]
impl SheetOperations for SheetsClient {
    #[instrument(name = "Creating spreadsheet", skip(self))]
    async fn create_spreadsheet(&self, title: &str) -> Result<Spreadsheet> {
        let spreadsheet = google_sheets4::api::Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(title.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        // Not idempotent: a 5xx after the server committed leaves an extra copy behind
        let (_, created) = self
            .call("Create spreadsheet", || {
                let call = self.sheets.spreadsheets().create(spreadsheet.clone());
                with_call_options!(self, call).doit()
            })
            .await?;

        let spreadsheet = Spreadsheet::new(created);
        info!(id = spreadsheet.id(), url = spreadsheet.url(), "Created spreadsheet");
        Ok(spreadsheet)
    }

    #[instrument(name = "Fetching spreadsheet", skip(self))]
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let (_, spreadsheet) = self
            .call("Get spreadsheet", || {
                let call = self.sheets.spreadsheets().get(spreadsheet_id);
                with_call_options!(self, call).doit()
            })
            .await?;

        Ok(Spreadsheet::new(spreadsheet))
    }

    #[instrument(name = "Fetching spreadsheet with data", skip(self))]
    async fn get_spreadsheet_with_data(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let (_, spreadsheet) = self
            .call("Get spreadsheet with data", || {
                let call = self.sheets.spreadsheets().get(spreadsheet_id).include_grid_data(true);
                with_call_options!(self, call).doit()
            })
            .await?;

        Ok(Spreadsheet::new(spreadsheet))
    }

    #[instrument(name = "Writing sheet", skip(self, data), fields(rows = data.len()))]
    async fn update_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_title: &str,
        anchor: CellPos,
        data: &[Vec<String>],
    ) -> Result<SheetRange> {
        let range = SheetRange::new(sheet_title, anchor.range_for_data(data));
        let a1 = range.to_string();

        let values = data
            .iter()
            .map(|row| {
                row.iter()
                    .cloned()
                    .map(serde_json::Value::String)
                    .collect::<Vec<_>>()
            })
            .collect();
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(a1.clone()),
            values: Some(values),
        };

        self.call(&format!("Update {}", a1), || {
            let call = self
                .sheets
                .spreadsheets()
                .values_update(value_range.clone(), spreadsheet_id, &a1)
                .value_input_option("USER_ENTERED");
            with_call_options!(self, call).doit()
        })
        .await?;

        debug!(range = %range, "Wrote values");
        Ok(range)
    }

    #[instrument(name = "Adding sheet", skip(self, spreadsheet), fields(id = spreadsheet.id()))]
    async fn add_sheet(&self, spreadsheet: &mut Spreadsheet, title: &str) -> Result<Sheet> {
        if let Some(sheet) = spreadsheet.get_sheet(title) {
            debug!(sheet_id = ?sheet.sheet_id(), "Found existing sheet");
            return Ok(sheet);
        }

        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(title.to_string()),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        self.create_sheet_with(spreadsheet, request, title, "Add sheet")
            .await
    }

    #[instrument(name = "Duplicating sheet", skip(self, spreadsheet), fields(id = spreadsheet.id()))]
    async fn duplicate_sheet(
        &self,
        spreadsheet: &mut Spreadsheet,
        title: &str,
        new_title: &str,
    ) -> Result<Sheet> {
        let origin = spreadsheet
            .get_sheet(title)
            .ok_or_else(|| AppError::Sheets(format!("Origin sheet '{}' does not exist", title)))?;

        let request = Request {
            duplicate_sheet: Some(DuplicateSheetRequest {
                insert_sheet_index: Some(spreadsheet.next_sheet_index()),
                new_sheet_name: Some(new_title.to_string()),
                source_sheet_id: origin.sheet_id(),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.create_sheet_with(spreadsheet, request, new_title, "Duplicate sheet")
            .await
    }
}

#[async_trait]
impl DriveOperations for SheetsClient {
    #[instrument(name = "Listing files", skip(self))]
    async fn list_files(&self, query: &str) -> Result<Vec<File>> {
        let (_, file_list) = self
            .call("List files", || {
                let call = self
                    .drive
                    .files()
                    .list()
                    .page_size(10)
                    .q(query)
                    .param("fields", FILE_LIST_FIELDS);
                with_call_options!(self, call).doit()
            })
            .await?;

        Ok(file_list.files.unwrap_or_default())
    }

    #[instrument(name = "Copying file", skip(self))]
    async fn copy_file(&self, file_id: &str, new_name: &str) -> Result<File> {
        let file = File {
            name: Some(new_name.to_string()),
            ..Default::default()
        };

        let (_, copy) = self
            .call(&format!("Copy file {}", file_id), || {
                let call = self.drive.files().copy(file.clone(), file_id);
                with_call_options!(self, call).doit()
            })
            .await?;

        Ok(copy)
    }

    #[instrument(name = "Deleting file", skip(self))]
    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.call(&format!("Delete file {}", file_id), || {
            let call = self.drive.files().delete(file_id);
            with_call_options!(self, call).doit()
        })
        .await?;

        Ok(())
    }

    #[instrument(name = "Sharing file", skip(self))]
    async fn share_file(&self, file_id: &str, email: &str, notify: bool) -> Result<()> {
        let permission = Permission {
            email_address: Some(email.to_string()),
            role: Some("writer".to_string()),
            type_: Some("user".to_string()),
            ..Default::default()
        };

        self.call(&format!("Share {} with {}", file_id, email), || {
            let call = self
                .drive
                .permissions()
                .create(permission.clone(), file_id)
                .send_notification_email(notify);
            with_call_options!(self, call).doit()
        })
        .await?;

        Ok(())
    }

    #[instrument(name = "Sharing file with anyone", skip(self))]
    async fn share_with_anyone(&self, file_id: &str) -> Result<()> {
        let permission = Permission {
            role: Some("writer".to_string()),
            type_: Some("anyone".to_string()),
            allow_file_discovery: Some(false),
            ..Default::default()
        };

        self.call(&format!("Share {} with anyone", file_id), || {
            let call = self.drive.permissions().create(permission.clone(), file_id);
            with_call_options!(self, call).doit()
        })
        .await?;

        Ok(())
    }

    #[instrument(name = "Revoking access", skip(self))]
    async fn revoke(&self, file_id: &str, email: &str) -> Result<bool> {
        let mut page_token: Option<String> = None;

        loop {
            let (_, permission_list) = self
                .call(&format!("List permissions for {}", file_id), || {
                    let mut call = self
                        .drive
                        .permissions()
                        .list(file_id)
                        .param("fields", PERMISSION_LIST_FIELDS);
                    if let Some(token) = &page_token {
                        call = call.page_token(token);
                    }
                    with_call_options!(self, call).doit()
                })
                .await?;

            let permission_id = permission_list
                .permissions
                .unwrap_or_default()
                .into_iter()
                .find(|p| p.email_address.as_deref() == Some(email))
                .and_then(|p| p.id);

            if let Some(permission_id) = permission_id {
                self.call(&format!("Revoke {} from {}", email, file_id), || {
                    let call = self.drive.permissions().delete(file_id, &permission_id);
                    with_call_options!(self, call).doit()
                })
                .await?;
                return Ok(true);
            }

            match permission_list.next_page_token {
                Some(token) => page_token = Some(token),
                None => {
                    debug!("No permission found for email");
                    return Ok(false);
                }
            }
        }
    }

    #[instrument(name = "Transferring ownership", skip(self))]
    async fn transfer_ownership(&self, file_id: &str, email: &str) -> Result<()> {
        let permission = Permission {
            email_address: Some(email.to_string()),
            role: Some("owner".to_string()),
            type_: Some("user".to_string()),
            ..Default::default()
        };

        self.call(&format!("Transfer {} to {}", file_id, email), || {
            let call = self
                .drive
                .permissions()
                .create(permission.clone(), file_id)
                .transfer_ownership(true);
            with_call_options!(self, call).doit()
        })
        .await?;

        Ok(())
    }
}
