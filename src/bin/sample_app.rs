use anyhow::Result;
use sample_app::cli::start;

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    action.execute().await?;

    Ok(())
}
