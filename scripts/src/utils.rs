//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    artifacts::ArtifactStore,
    client::{AlloyChainClient, ReceiptPolling},
    errors::ScriptError,
};

/// Sets up a signing chain client from a private key and RPC url, checking
/// that the node is reachable
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
    artifacts: ArtifactStore,
    polling: ReceiptPolling,
) -> Result<AlloyChainClient, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();

    let wallet = EthereumWallet::from(signer);
    let provider = DynProvider::new(ProviderBuilder::new().wallet(wallet).on_http(url));
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!(chain_id, sender = %format!("{sender:#x}"), "connected to {rpc_url}");

    Ok(AlloyChainClient::new(provider, sender, artifacts, polling))
}

/// Read an address from the deployments file
pub fn read_deployment(deployments_path: &Path, key: &str) -> Result<Address, ScriptError> {
    let deployments = read_deployments(deployments_path)?;
    let addr_str = deployments.get(key).and_then(Value::as_str).ok_or_else(|| {
        ScriptError::ReadDeployments(format!(
            "key {key} not found in {}",
            deployments_path.display()
        ))
    })?;

    Address::from_str(addr_str)
        .map_err(|e| ScriptError::ReadDeployments(format!("invalid address {addr_str}: {e}")))
}

/// Write deployed addresses to the deployments file, keeping any entries
/// already recorded under other keys
pub fn write_deployed_addresses<'a>(
    deployments_path: &Path,
    addresses: impl IntoIterator<Item = (&'a str, Address)>,
) -> Result<(), ScriptError> {
    // If the file doesn't exist, start from an empty object
    let mut deployments = if deployments_path.exists() {
        read_deployments(deployments_path)?
    } else {
        Map::new()
    };

    for (key, address) in addresses {
        deployments.insert(key.to_string(), Value::String(format!("{address:#x}")));
    }

    let contents = serde_json::to_string_pretty(&Value::Object(deployments))
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(deployments_path, contents)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}

/// Parse the deployments file into a JSON object
fn read_deployments(deployments_path: &Path) -> Result<Map<String, Value>, ScriptError> {
    let content = fs::read_to_string(deployments_path).map_err(|e| {
        ScriptError::ReadDeployments(format!("{}: {e}", deployments_path.display()))
    })?;

    match serde_json::from_str(&content) {
        Ok(Value::Object(deployments)) => Ok(deployments),
        Ok(_) => Err(ScriptError::ReadDeployments(format!(
            "{} is not a JSON object",
            deployments_path.display()
        ))),
        Err(e) => Err(ScriptError::ReadDeployments(e.to_string())),
    }
}
