//! Implementations of the deploy and upgrade scripts

use std::path::Path;

use tracing::info;

use crate::{
    artifacts::ArtifactStore,
    cli::{DeployDiamondArgs, UpgradeArgs},
    client::AlloyChainClient,
    config::{DiamondPlan, UpgradePlan},
    constants::{DIAMOND_CUT_FACET_KEY, DIAMOND_INIT_KEY, DIAMOND_PROXY_KEY},
    deployer::DiamondDeployer,
    errors::ScriptError,
    events::TracingSink,
    utils::{read_deployment, write_deployed_addresses},
};

/// Deploy a new diamond and record its addresses
pub async fn deploy_diamond(
    args: DeployDiamondArgs,
    client: AlloyChainClient,
    artifacts: ArtifactStore,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let plan = DiamondPlan::load(args.config.as_deref())?;

    let mut deployer = DiamondDeployer::new(client, artifacts, TracingSink);
    let deployment = deployer.deploy_diamond(&plan).await?;

    let mut addresses = vec![
        (DIAMOND_PROXY_KEY, deployment.proxy),
        (DIAMOND_CUT_FACET_KEY, deployment.cut_facet),
    ];
    if let Some(initializer) = deployment.initializer {
        addresses.push((DIAMOND_INIT_KEY, initializer));
    }
    addresses.extend(deployment.auxiliaries.iter().map(|(label, addr)| (label.as_str(), *addr)));
    addresses.extend(deployment.facets.iter().map(|facet| (facet.name.as_str(), facet.address)));
    write_deployed_addresses(deployments_path, addresses)?;

    info!(
        proxy = %format!("{:#x}", deployment.proxy),
        deployments = %deployments_path.display(),
        "diamond deployed"
    );

    Ok(())
}

/// Upgrade an existing diamond and record the new facets' addresses
pub async fn upgrade_diamond(
    args: UpgradeArgs,
    client: AlloyChainClient,
    artifacts: ArtifactStore,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let plan = UpgradePlan::load(&args.config)?;
    let proxy = match args.proxy {
        Some(proxy) => proxy,
        None => read_deployment(deployments_path, DIAMOND_PROXY_KEY)?,
    };

    let mut deployer = DiamondDeployer::new(client, artifacts, TracingSink);
    let upgrade = deployer.upgrade_diamond(proxy, &plan).await?;

    let mut addresses: Vec<_> =
        upgrade.facets.iter().map(|facet| (facet.name.as_str(), facet.address)).collect();
    if let (Some(address), Some(init)) = (upgrade.initializer, &plan.initializer) {
        addresses.push((init.contract.as_str(), address));
    }
    write_deployed_addresses(deployments_path, addresses)?;

    info!(
        proxy = %format!("{proxy:#x}"),
        records = upgrade.cuts.len(),
        "diamond upgraded"
    );

    Ok(())
}
