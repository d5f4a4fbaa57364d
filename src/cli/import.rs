use clap::Args;
use gsheets::error::Result;
use gsheets::import::{Importer, Sharing};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV or TSV file to import
    pub file: PathBuf,

    /// Spreadsheet title, defaults to the file name
    #[arg(long)]
    pub title: Option<String>,

    /// Field delimiter, defaults to ',' for .csv files and tab otherwise
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Grant write access to this user (repeatable)
    #[arg(long = "share", value_name = "EMAIL")]
    pub recipients: Vec<String>,

    /// Send a notification email to each user shared with
    #[arg(long)]
    pub notify: bool,

    /// Let anyone with the link edit
    #[arg(long)]
    pub anyone: bool,

    /// Transfer ownership to this user after sharing
    #[arg(long, value_name = "EMAIL")]
    pub owner: Option<String>,
}

impl ImportArgs {
    pub async fn execute(&self) -> Result<()> {
        let data = super::read_table(&self.file, self.delimiter)?;
        let title = self.title.clone().unwrap_or_else(|| {
            self.file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled".to_string())
        });

        let sharing = Sharing {
            recipients: self.recipients.clone(),
            notify: self.notify,
            anyone: self.anyone,
            owner: self.owner.clone(),
        };

        let client = super::connect().await?;
        let spreadsheet = Importer::new(client, sharing).import(&title, &data).await?;

        info!(
            title = spreadsheet.title(),
            url = spreadsheet.url(),
            "Import completed"
        );

        Ok(())
    }
}
