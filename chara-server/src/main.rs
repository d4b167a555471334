use anyhow::Result;
use chara_server::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Local credentials, e.g. CHARA__CLOUDINARY__API_SECRET, may live in .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let addr = settings.addr();
    let app = chara_server::build_with(&settings).await?;

    app.listen(addr).await?;

    Ok(())
}
