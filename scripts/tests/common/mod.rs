//! An in-memory chain and artifact store for exercising the deployer

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::{
    json_abi::Param,
    primitives::{Address, Bytes, Selector, TxHash, B256},
};
use async_trait::async_trait;
use diamond_scripts::{
    client::{ChainClient, ContractArtifacts},
    errors::ScriptError,
    events::{DeployEvent, EventSink},
    types::CutReceipt,
};
use serde_json::json;

/// The signature of the cut facet's entry point
pub const DIAMOND_CUT_SIGNATURE: &str = "diamondCut((address,uint8,bytes4[])[],address,bytes)";
/// The loupe facet's functions
pub const LOUPE_SIGNATURES: &[&str] = &[
    "facets()",
    "facetFunctionSelectors(address)",
    "facetAddresses()",
    "facetAddress(bytes4)",
    "supportsInterface(bytes4)",
];
/// The ownership facet's functions
pub const OWNERSHIP_SIGNATURES: &[&str] = &["transferOwnership(address)", "owner()"];
/// The inventory facet's functions, which include its own `supportsInterface`
pub const INVENTORY_SIGNATURES: &[&str] = &[
    "init(address,address)",
    "equip(uint256,uint256,uint256)",
    "unequip(uint256,uint256)",
    "supportsInterface(bytes4)",
];

/// The address the mock chain assigns to the first deployment
const FIRST_DEPLOYMENT_BYTE: u8 = 0x10;

// --------------
// | Mock Chain |
// --------------

/// A contract deployment the mock chain received
#[derive(Clone, Debug)]
pub struct Deployment {
    /// The contract name
    pub contract: String,
    /// The encoded constructor arguments
    pub constructor_args: Bytes,
    /// The address assigned to the contract
    pub address: Address,
}

/// The state of the mock chain
#[derive(Debug, Default)]
struct ChainState {
    /// Deployments, in the order they were received
    deployments: Vec<Deployment>,
    /// Submitted transactions as `(to, data)`
    submissions: Vec<(Address, Bytes)>,
    /// Whether submitted transactions revert
    revert: bool,
    /// A contract whose deployment fails
    failing_contract: Option<String>,
    /// The routes reported by the loupe
    routes: Vec<(Address, Vec<Selector>)>,
}

/// A chain that confirms every deployment immediately
#[derive(Clone, Debug)]
pub struct MockChain {
    /// The sender address
    sender: Address,
    /// The shared chain state
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    /// A chain on which every transaction succeeds
    pub fn new() -> Self {
        Self {
            sender: Address::with_last_byte(0xaa),
            state: Arc::default(),
        }
    }

    /// A chain on which every submitted transaction reverts
    pub fn reverting() -> Self {
        let chain = Self::new();
        chain.state.lock().unwrap().revert = true;
        chain
    }

    /// A chain on which deploying the given contract fails
    pub fn failing_deployment(contract: &str) -> Self {
        let chain = Self::new();
        chain.state.lock().unwrap().failing_contract = Some(contract.to_string());
        chain
    }

    /// A chain whose loupe reports the given routes
    pub fn with_routes(self, routes: Vec<(Address, Vec<Selector>)>) -> Self {
        self.state.lock().unwrap().routes = routes;
        self
    }

    /// The sender address
    pub fn sender_address(&self) -> Address {
        self.sender
    }

    /// The deployments received so far
    pub fn deployments(&self) -> Vec<Deployment> {
        self.state.lock().unwrap().deployments.clone()
    }

    /// The names of the contracts deployed so far, in order
    pub fn deployed_contracts(&self) -> Vec<String> {
        self.deployments().into_iter().map(|d| d.contract).collect()
    }

    /// The transactions submitted so far
    pub fn submissions(&self) -> Vec<(Address, Bytes)> {
        self.state.lock().unwrap().submissions.clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(
        &self,
        contract: &str,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_contract.as_deref() == Some(contract) {
            return Err(ScriptError::ContractDeployment {
                contract: contract.to_string(),
                reason: "out of gas".to_string(),
            });
        }

        let address = Address::with_last_byte(FIRST_DEPLOYMENT_BYTE + state.deployments.len() as u8);
        state.deployments.push(Deployment {
            contract: contract.to_string(),
            constructor_args,
            address,
        });

        Ok(address)
    }

    async fn submit(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError> {
        let mut state = self.state.lock().unwrap();
        state.submissions.push((to, data));
        Ok(B256::with_last_byte(state.submissions.len() as u8))
    }

    async fn await_receipt(&self, tx_hash: TxHash) -> Result<CutReceipt, ScriptError> {
        let state = self.state.lock().unwrap();
        Ok(CutReceipt {
            tx_hash,
            success: !state.revert,
        })
    }

    async fn facet_routes(
        &self,
        _proxy: Address,
    ) -> Result<Vec<(Address, Vec<Selector>)>, ScriptError> {
        Ok(self.state.lock().unwrap().routes.clone())
    }
}

// ------------------
// | Mock Artifacts |
// ------------------

/// Interface metadata for a fixed set of contracts
#[derive(Clone, Debug, Default)]
pub struct MockArtifacts {
    /// Exposed signatures and constructor parameters, keyed by contract name
    contracts: HashMap<String, (Vec<String>, Vec<Param>)>,
}

impl MockArtifacts {
    /// The contracts of the reference deployment
    pub fn reference() -> Self {
        Self::default()
            .with_contract("DiamondCutFacet", &[DIAMOND_CUT_SIGNATURE])
            .with_contract("Diamond", &[])
            .with_contract("DiamondInit", &["init()"])
            .with_contract("DiamondLoupeFacet", LOUPE_SIGNATURES)
            .with_contract("OwnershipFacet", OWNERSHIP_SIGNATURES)
            .with_contract("InventoryFacet", INVENTORY_SIGNATURES)
            .with_contract("MockERC721", &["ownerOf(uint256)"])
            .with_contract("MockTerminus", &["balanceOf(address,uint256)"])
            .with_constructor("MockERC20", &["balanceOf(address)"], &["string", "string"])
    }

    /// Add a contract with no constructor parameters
    pub fn with_contract(self, name: &str, signatures: &[&str]) -> Self {
        self.with_constructor(name, signatures, &[])
    }

    /// Add a contract whose constructor takes parameters of the given types
    pub fn with_constructor(mut self, name: &str, signatures: &[&str], params: &[&str]) -> Self {
        let params: Vec<Param> = params
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                serde_json::from_value(json!({ "name": format!("arg{i}"), "type": ty })).unwrap()
            })
            .collect();
        let signatures: Vec<String> = signatures.iter().map(ToString::to_string).collect();

        self.contracts.insert(name.to_string(), (signatures, params));
        self
    }

    /// Look up a contract
    fn contract(&self, name: &str) -> Result<&(Vec<String>, Vec<Param>), ScriptError> {
        self.contracts
            .get(name)
            .ok_or_else(|| ScriptError::ArtifactParsing(format!("no artifact for {name}")))
    }
}

impl ContractArtifacts for MockArtifacts {
    fn exposed_signatures(&self, contract: &str) -> Result<Vec<String>, ScriptError> {
        self.contract(contract).map(|(signatures, _)| signatures.clone())
    }

    fn constructor_params(&self, contract: &str) -> Result<Vec<Param>, ScriptError> {
        self.contract(contract).map(|(_, params)| params.clone())
    }
}

// --------------
// | Event Sink |
// --------------

/// Records every event it receives
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    /// The events received so far
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl RecordingSink {
    /// The events received so far
    pub fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DeployEvent) {
        self.events.lock().unwrap().push(event);
    }
}
