use clap::Subcommand;
use gsheets::config::Config;
use gsheets::error::Result;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration and cache paths
    Paths,
    /// Show the retry settings in effect
    Retry,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Retry => show_retry(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    let cache_dir = Config::cache_dir()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?cache_dir, "Cache path");

    Ok(())
}

fn show_retry() -> Result<()> {
    let policy = Config::load()?.retry_policy();

    info!(delay = ?policy.delay, max_attempts = policy.max_attempts, "Retry policy");

    Ok(())
}
