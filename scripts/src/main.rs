use clap::Parser;
use diamond_scripts::{artifacts::ArtifactStore, cli::Cli, utils::setup_client};
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

/// The log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().pretty().with_env_filter(filter).init();

    let polling = cli.receipt_polling();
    let Cli {
        priv_key,
        rpc_url,
        artifacts,
        deployments_path,
        command,
        ..
    } = cli;

    let artifacts = ArtifactStore::new(artifacts);
    let client = setup_client(&priv_key, &rpc_url, artifacts.clone(), polling)
        .await
        .wrap_err_with(|| format!("connecting to {rpc_url}"))?;

    command.run(client, artifacts, deployments_path).await?;
    Ok(())
}
