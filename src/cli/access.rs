use clap::Subcommand;
use gsheets::error::Result;
use gsheets::sheets::DriveOperations;
use tracing::{info, warn};

#[derive(Subcommand, Debug)]
pub enum AccessAction {
    /// Give a user write access
    Share {
        file_id: String,
        email: String,
        /// Send Drive's notification email
        #[arg(long)]
        notify: bool,
    },
    /// Let anyone with the link edit
    Anyone { file_id: String },
    /// Remove a user's access
    Revoke { file_id: String, email: String },
    /// Make a user the owner of the file
    Transfer {
        file_id: String,
        email: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl AccessAction {
    pub async fn execute(&self) -> Result<()> {
        match self {
            AccessAction::Share {
                file_id,
                email,
                notify,
            } => {
                let client = super::connect().await?;
                client.share_file(file_id, email, *notify).await?;
                info!(file_id, email, "Shared file");
            }
            AccessAction::Anyone { file_id } => {
                let client = super::connect().await?;
                client.share_with_anyone(file_id).await?;
                info!(file_id, "Shared file with anyone");
            }
            AccessAction::Revoke { file_id, email } => {
                let client = super::connect().await?;
                match client.revoke(file_id, email).await? {
                    true => info!(file_id, email, "Revoked access"),
                    false => warn!(file_id, email, "No permission found for user"),
                }
            }
            AccessAction::Transfer {
                file_id,
                email,
                yes,
            } => {
                let prompt = format!("Transfer ownership of {} to {}?", file_id, email);
                if !super::confirm(&prompt, *yes)? {
                    info!("Aborted");
                    return Ok(());
                }
                let client = super::connect().await?;
                client.transfer_ownership(file_id, email).await?;
                info!(file_id, email, "Transferred ownership");
            }
        }

        Ok(())
    }
}
