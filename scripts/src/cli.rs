//! Definitions of CLI arguments and commands for the diamond scripts

use std::{path::PathBuf, time::Duration};

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

use crate::{
    artifacts::ArtifactStore,
    client::{AlloyChainClient, ReceiptPolling},
    commands::{deploy_diamond, upgrade_diamond},
    constants::{DEFAULT_RECEIPT_POLL_ATTEMPTS, DEFAULT_RECEIPT_POLL_INTERVAL_MS},
    errors::ScriptError,
};

/// Deploy and upgrade EIP-2535 diamond proxies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(long = "pkey", env = "PKEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = "http://localhost:8545")]
    pub rpc_url: String,

    /// Directory holding the compiled contract artifacts
    #[arg(short, long, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Path to a `deployments.json` file, in which to store deployed addresses
    #[arg(short, long, default_value = "deployments.json")]
    pub deployments_path: PathBuf,

    /// Number of times to poll for a transaction receipt
    #[arg(long, default_value_t = DEFAULT_RECEIPT_POLL_ATTEMPTS)]
    pub receipt_attempts: u32,

    /// Milliseconds to wait between receipt polls
    #[arg(long, default_value_t = DEFAULT_RECEIPT_POLL_INTERVAL_MS)]
    pub receipt_interval_ms: u64,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The receipt polling configuration given on the command line
    pub fn receipt_polling(&self) -> ReceiptPolling {
        ReceiptPolling {
            attempts: self.receipt_attempts,
            interval: Duration::from_millis(self.receipt_interval_ms),
        }
    }
}

/// The scripts' subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a new diamond
    DeployDiamond(DeployDiamondArgs),
    /// Cut new facets into an existing diamond
    Upgrade(UpgradeArgs),
}

impl Command {
    /// Run the command against the given client
    pub async fn run(
        self,
        client: AlloyChainClient,
        artifacts: ArtifactStore,
        deployments_path: PathBuf,
    ) -> Result<(), ScriptError> {
        match self {
            Command::DeployDiamond(args) => {
                deploy_diamond(args, client, artifacts, &deployments_path).await
            }
            Command::Upgrade(args) => {
                upgrade_diamond(args, client, artifacts, &deployments_path).await
            }
        }
    }
}

/// Deploy a diamond: the cut facet, the proxy, any auxiliary contracts, the
/// initializer and the facets, followed by a single `diamondCut` wiring the
/// facets into the proxy.
///
/// Without a plan file, the reference deployment is used.
#[derive(Args)]
pub struct DeployDiamondArgs {
    /// Path to a JSON deployment plan
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Upgrade an existing diamond
#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the diamond proxy, read from the deployments file if omitted
    #[arg(long)]
    pub proxy: Option<Address>,

    /// Path to a JSON upgrade plan
    #[arg(short, long)]
    pub config: PathBuf,
}
