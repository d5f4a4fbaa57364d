use gsheets::error::Result;
use gsheets::sheets::clear_tokens;
use tracing::info;

pub async fn execute(reset: bool) -> Result<()> {
    if reset {
        clear_tokens()?;
    }

    let _client = super::connect().await?;

    info!("Google authentication verified");

    Ok(())
}
