mod access;
mod auth;
mod files;
mod import;
mod sheet;
mod show;

use clap::{Parser, Subcommand};
use gsheets::config::Config;
use gsheets::error::{AppError, Result};
use gsheets::sheets::SheetsClient;
use gsheets::tabular::{TabularData, read_delimited, read_tsv};
use std::fs::File;
use std::path::Path;

pub use access::AccessAction;
pub use files::FilesAction;
pub use import::ImportArgs;
pub use sheet::SheetAction;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "gsheets")]
#[command(about = "Create, fill and share Google Sheets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Import(args) => args.execute().await,
            Commands::Files { action } => action.execute().await,
            Commands::Access { action } => action.execute().await,
            Commands::Sheet { action } => action.execute().await,
            Commands::Auth { reset } => auth::execute(*reset).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a spreadsheet from a CSV/TSV file and share it
    Import(ImportArgs),
    /// List, copy and delete Drive files
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
    /// Manage who can access a file
    Access {
        #[command(subcommand)]
        action: AccessAction,
    },
    /// Read and modify tabs of an existing spreadsheet
    Sheet {
        #[command(subcommand)]
        action: SheetAction,
    },
    /// Verify Google authentication
    Auth {
        /// Clear cached tokens before authenticating
        #[arg(long)]
        reset: bool,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}

async fn connect() -> Result<SheetsClient> {
    let config = Config::load()?;
    SheetsClient::new(&config).await
}

/// Read a delimited file. Without an explicit delimiter `.csv` files are
/// comma-separated and everything else is tab-separated.
fn read_table(path: &Path, delimiter: Option<char>) -> Result<TabularData> {
    let delimiter = delimiter.unwrap_or_else(|| {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ',',
            _ => '\t',
        }
    });
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| AppError::Config(format!("Delimiter {:?} must be ASCII", delimiter)))?;

    let file = File::open(path)?;
    match delimiter {
        b'\t' => read_tsv(file),
        other => read_delimited(file, other),
    }
}

/// Ask before doing something that cannot be undone, unless `yes` was given.
fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::Other(e.into()))
}
