//! Orchestration of diamond deployments and upgrades
//!
//! A run deploys contracts one at a time, each awaited before the next is
//! sent, then wires the facets into the proxy with a single atomic
//! `diamondCut` transaction. Nothing is retried; a failed run leaves the
//! deployer in [`UpgradeStage::Failed`] and the caller starts over with a
//! fresh deployer.

use alloy::primitives::{Address, Bytes, TxHash};
use indexmap::IndexMap;

use crate::{
    calldata::{encode_call, encode_constructor_args, encode_proxy_constructor, UpgradeTransaction},
    client::{ChainClient, ContractArtifacts},
    config::{DiamondPlan, FacetPlan, InitializerPlan, UpgradePlan},
    cut::{facet_routes, loupe_routes, total_selectors, CutListBuilder, FacetCutPlan},
    errors::ScriptError,
    events::{DeployEvent, EventSink},
    types::{DiamondDeployment, DiamondUpgrade, FacetCut, FacetDescriptor, UpgradeStage},
};

/// Deploys a diamond, or upgrades an existing one, reporting progress to an
/// [`EventSink`]
pub struct DiamondDeployer<C, A, S> {
    /// The chain the contracts are deployed to
    client: C,
    /// Interface metadata of the contracts
    artifacts: A,
    /// The consumer of progress events
    sink: S,
    /// The stage of the current run
    stage: UpgradeStage,
}

impl<C: ChainClient, A: ContractArtifacts, S: EventSink> DiamondDeployer<C, A, S> {
    /// Create a deployer that has not started a run
    pub fn new(client: C, artifacts: A, sink: S) -> Self {
        Self {
            client,
            artifacts,
            sink,
            stage: UpgradeStage::Unstarted,
        }
    }

    /// The stage of the current run
    pub fn stage(&self) -> UpgradeStage {
        self.stage
    }

    /// The chain client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Deploy a new diamond according to the plan.
    ///
    /// Deploys the cut facet, the proxy bound to the owner and cut facet, the
    /// auxiliary contracts, the initializer and the facets, in that order, then
    /// cuts the facets into the proxy and calls the initializer.
    pub async fn deploy_diamond(
        &mut self,
        plan: &DiamondPlan,
    ) -> Result<DiamondDeployment, ScriptError> {
        self.start()?;
        let res = self.run_deploy(plan).await;
        self.finish(res)
    }

    /// Upgrade an existing diamond according to the plan.
    ///
    /// The proxy's current routes are read through its loupe and every record
    /// of the new cut is checked against them.
    pub async fn upgrade_diamond(
        &mut self,
        proxy: Address,
        plan: &UpgradePlan,
    ) -> Result<DiamondUpgrade, ScriptError> {
        self.start()?;
        let res = self.run_upgrade(proxy, plan).await;
        self.finish(res)
    }

    // ------------
    // | Run Flow |
    // ------------

    /// Deploy the diamond and submit its first cut
    async fn run_deploy(&mut self, plan: &DiamondPlan) -> Result<DiamondDeployment, ScriptError> {
        let cut_facet = self.deploy_contract(&plan.cut_facet, &plan.cut_facet, &[]).await?;

        let owner = plan.owner.unwrap_or_else(|| self.client.sender());
        let proxy = self
            .deploy_with_args(&plan.proxy, &plan.proxy, encode_proxy_constructor(owner, cut_facet))
            .await?;

        let mut auxiliaries = IndexMap::new();
        for aux in &plan.auxiliary {
            let address = self.deploy_contract(aux.label(), &aux.contract, &aux.args).await?;
            auxiliaries.insert(aux.label().to_string(), address);
        }

        let initializer = self.deploy_initializer(plan.initializer.as_ref()).await?;
        let facets = self.deploy_facets(&plan.facets).await?;
        self.set_stage(UpgradeStage::FacetsDeployed);

        // The proxy constructor routes the cut facet's functions
        let cut_descriptor = FacetDescriptor::new(
            plan.cut_facet.clone(),
            cut_facet,
            self.artifacts.exposed_signatures(&plan.cut_facet)?,
        );
        let builder = CutListBuilder::new().with_existing_routes(facet_routes(&cut_descriptor)?);
        let plans = cut_plans(&plan.facets, &facets);
        let cuts = self.build_cut(&builder, &plans)?;

        let init_address = initializer.as_ref().map(|(address, _)| *address);
        let tx = upgrade_transaction(cuts, initializer);
        let cut_tx = self.submit_cut(proxy, &tx).await?;

        Ok(DiamondDeployment {
            proxy,
            owner,
            cut_facet,
            initializer: init_address,
            auxiliaries,
            facets,
            cut_tx,
        })
    }

    /// Deploy the upgrade's contracts and submit the cut to an existing proxy
    async fn run_upgrade(
        &mut self,
        proxy: Address,
        plan: &UpgradePlan,
    ) -> Result<DiamondUpgrade, ScriptError> {
        let routes = self.client.facet_routes(proxy).await?;
        let builder = CutListBuilder::new().with_existing_routes(loupe_routes(&routes));

        let initializer = self.deploy_initializer(plan.initializer.as_ref()).await?;
        let facets = self.deploy_facets(&plan.facets).await?;
        self.set_stage(UpgradeStage::FacetsDeployed);

        let mut plans = cut_plans(&plan.facets, &facets);
        if !plan.remove.is_empty() {
            plans.push(FacetCutPlan::remove(plan.remove.clone()));
        }
        let cuts = self.build_cut(&builder, &plans)?;

        let init_address = initializer.as_ref().map(|(address, _)| *address);
        let tx = upgrade_transaction(cuts, initializer);
        let cut_tx = self.submit_cut(proxy, &tx).await?;

        Ok(DiamondUpgrade {
            proxy,
            initializer: init_address,
            facets,
            cuts: tx.cuts,
            cut_tx,
        })
    }

    /// Build the cut list and report each of its records
    fn build_cut(
        &mut self,
        builder: &CutListBuilder,
        plans: &[FacetCutPlan],
    ) -> Result<Vec<FacetCut>, ScriptError> {
        let cuts = builder.build(plans)?;
        for cut in &cuts {
            self.sink.emit(DeployEvent::CutRecordResolved {
                facet: cut.facet_name.clone(),
                address: cut.facet_address,
                action: cut.action,
                signatures: cut.selectors.iter().map(|(_, sig)| sig.clone()).collect(),
            });
        }

        self.sink.emit(DeployEvent::CutBuilt {
            records: cuts.len(),
            selectors: total_selectors(&cuts),
        });
        self.set_stage(UpgradeStage::CutListBuilt);
        Ok(cuts)
    }

    /// Submit the cut to the proxy and wait for it to be mined
    async fn submit_cut(
        &mut self,
        proxy: Address,
        tx: &UpgradeTransaction,
    ) -> Result<TxHash, ScriptError> {
        let tx_hash = self.client.submit(proxy, tx.calldata()).await?;
        self.set_stage(UpgradeStage::Submitted);
        self.sink.emit(DeployEvent::TransactionSubmitted { tx_hash });

        let receipt = self.client.await_receipt(tx_hash).await?;
        if !receipt.success {
            self.sink.emit(DeployEvent::TransactionFailed { tx_hash });
            return Err(ScriptError::UpgradeFailed { tx_hash });
        }

        self.sink.emit(DeployEvent::TransactionConfirmed { tx_hash });
        self.set_stage(UpgradeStage::Confirmed);
        Ok(tx_hash)
    }

    // ---------------
    // | Deployments |
    // ---------------

    /// Deploy the initializer and encode its call, if one is planned
    async fn deploy_initializer(
        &mut self,
        init: Option<&InitializerPlan>,
    ) -> Result<Option<(Address, Bytes)>, ScriptError> {
        let Some(init) = init else {
            return Ok(None);
        };

        // Encoded first so a bad signature fails before anything is deployed
        let calldata = encode_call(&init.signature, &init.args)?;
        let address = self.deploy_contract(&init.contract, &init.contract, &[]).await?;
        Ok(Some((address, calldata)))
    }

    /// Deploy the facets in order
    async fn deploy_facets(
        &mut self,
        facets: &[FacetPlan],
    ) -> Result<Vec<FacetDescriptor>, ScriptError> {
        let mut descriptors = Vec::with_capacity(facets.len());
        for facet in facets {
            let signatures = self.artifacts.exposed_signatures(&facet.contract)?;
            let address = self.deploy_contract(&facet.contract, &facet.contract, &[]).await?;
            descriptors.push(FacetDescriptor::new(facet.contract.clone(), address, signatures));
        }

        Ok(descriptors)
    }

    /// Deploy a contract, encoding its constructor arguments against the
    /// artifact's constructor
    async fn deploy_contract(
        &mut self,
        label: &str,
        contract: &str,
        args: &[String],
    ) -> Result<Address, ScriptError> {
        let params = self.artifacts.constructor_params(contract)?;
        let constructor_args = encode_constructor_args(&params, args)?;
        self.deploy_with_args(label, contract, constructor_args).await
    }

    /// Deploy a contract with pre-encoded constructor arguments
    async fn deploy_with_args(
        &mut self,
        label: &str,
        contract: &str,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        self.sink.emit(DeployEvent::DeploymentStarted {
            contract: label.to_string(),
        });

        let address = self.client.deploy(contract, constructor_args).await?;
        self.sink.emit(DeployEvent::DeploymentCompleted {
            contract: label.to_string(),
            address,
        });

        Ok(address)
    }

    // ----------
    // | Stages |
    // ----------

    /// Begin a run, which is only allowed from a fresh deployer
    fn start(&self) -> Result<(), ScriptError> {
        match self.stage {
            UpgradeStage::Unstarted => Ok(()),
            stage => Err(ScriptError::InvalidStage(stage)),
        }
    }

    /// Mark the run failed if it returned an error
    fn finish<T>(&mut self, res: Result<T, ScriptError>) -> Result<T, ScriptError> {
        if res.is_err() {
            self.set_stage(UpgradeStage::Failed);
        }

        res
    }

    /// Move to a new stage and report the transition
    fn set_stage(&mut self, to: UpgradeStage) {
        let from = std::mem::replace(&mut self.stage, to);
        if from != to {
            self.sink.emit(DeployEvent::StageChanged { from, to });
        }
    }
}

// -----------
// | Helpers |
// -----------

/// Pair each planned facet with its deployment
fn cut_plans(facets: &[FacetPlan], descriptors: &[FacetDescriptor]) -> Vec<FacetCutPlan> {
    facets
        .iter()
        .zip(descriptors)
        .map(|(facet, descriptor)| facet.cut_plan(descriptor.clone()))
        .collect()
}

/// Assemble the cut transaction, attaching the initializer call if any
fn upgrade_transaction(
    cuts: Vec<FacetCut>,
    initializer: Option<(Address, Bytes)>,
) -> UpgradeTransaction {
    let tx = UpgradeTransaction::new(cuts);
    match initializer {
        Some((address, calldata)) => tx.with_initializer(address, calldata),
        None => tx,
    }
}
