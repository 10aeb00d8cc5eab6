use anyhow::{Error, Result, anyhow};
use card_notify::{api::run_api_server, config::Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install TLS crypto provider"))?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    tracing::info!(environment = %config.environment, "Configuration validated, starting server");

    run_api_server(config)
        .await
        .map_err(|e| anyhow!("API server failed: {e}"))?;

    Ok(())
}
