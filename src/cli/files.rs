use clap::Subcommand;
use gsheets::error::Result;
use gsheets::sheets::DriveOperations;
use tracing::info;

const SPREADSHEET_QUERY: &str =
    "mimeType='application/vnd.google-apps.spreadsheet' and trashed=false";

#[derive(Subcommand, Debug)]
pub enum FilesAction {
    /// List files matching a Drive query (spreadsheets by default)
    List {
        #[arg(long, default_value = SPREADSHEET_QUERY)]
        query: String,
    },
    /// Copy a spreadsheet
    Copy { file_id: String, new_name: String },
    /// Delete a file permanently
    Delete {
        file_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl FilesAction {
    pub async fn execute(&self) -> Result<()> {
        match self {
            FilesAction::List { query } => {
                let client = super::connect().await?;
                for file in client.list_files(query).await? {
                    println!(
                        "{}\t{}\t{}",
                        file.id.unwrap_or_default(),
                        file.mime_type.unwrap_or_default(),
                        file.name.unwrap_or_default()
                    );
                }
            }
            FilesAction::Copy { file_id, new_name } => {
                let client = super::connect().await?;
                let copy = client.copy_spreadsheet_from(file_id, new_name).await?;
                info!(id = copy.id(), url = copy.url(), "Copied spreadsheet");
            }
            FilesAction::Delete { file_id, yes } => {
                if !super::confirm(&format!("Delete {} permanently?", file_id), *yes)? {
                    info!("Aborted");
                    return Ok(());
                }
                let client = super::connect().await?;
                client.delete_file(file_id).await?;
                info!(file_id, "Deleted file");
            }
        }

        Ok(())
    }
}
