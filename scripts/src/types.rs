//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, Selector, TxHash};
use diamond_abi::IDiamondCut;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::selectors::SelectorSet;

/// A deployed facet and the function signatures its interface exposes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetDescriptor {
    /// The contract name the facet was deployed from
    pub name: String,
    /// The address the facet was deployed at
    pub address: Address,
    /// The exposed function signatures, in declaration order
    pub signatures: Vec<String>,
}

impl FacetDescriptor {
    /// Construct a descriptor for a deployed facet
    pub fn new(name: impl Into<String>, address: Address, signatures: Vec<String>) -> Self {
        Self {
            name: name.into(),
            address,
            signatures,
        }
    }
}

/// The action a cut record applies to its selectors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutAction {
    /// Route new selectors to the facet
    #[default]
    Add,
    /// Re-route existing selectors to the facet
    Replace,
    /// Drop existing selectors from the proxy
    Remove,
}

impl Display for CutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutAction::Add => write!(f, "add"),
            CutAction::Replace => write!(f, "replace"),
            CutAction::Remove => write!(f, "remove"),
        }
    }
}

impl From<CutAction> for IDiamondCut::FacetCutAction {
    fn from(action: CutAction) -> Self {
        match action {
            CutAction::Add => IDiamondCut::FacetCutAction::Add,
            CutAction::Replace => IDiamondCut::FacetCutAction::Replace,
            CutAction::Remove => IDiamondCut::FacetCutAction::Remove,
        }
    }
}

/// A single record of a diamond cut
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetCut {
    /// The name of the facet, used for logging
    pub facet_name: String,
    /// The facet address, zero for `Remove`
    pub facet_address: Address,
    /// The action to apply
    pub action: CutAction,
    /// The resolved selectors
    pub selectors: SelectorSet,
}

impl From<&FacetCut> for IDiamondCut::FacetCut {
    fn from(cut: &FacetCut) -> Self {
        IDiamondCut::FacetCut {
            facetAddress: cut.facet_address,
            action: cut.action.into(),
            functionSelectors: cut.selectors.selectors(),
        }
    }
}

/// The stages of a single deploy or upgrade run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeStage {
    /// Nothing has been sent to the chain yet
    Unstarted,
    /// The proxy, initializer and facets are deployed
    FacetsDeployed,
    /// The cut list has been built and checked for collisions
    CutListBuilt,
    /// The cut transaction has been submitted
    Submitted,
    /// The cut transaction succeeded
    Confirmed,
    /// The run was abandoned after an error
    Failed,
}

/// The receipt of a submitted transaction, as far as the deployer cares
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutReceipt {
    /// The transaction hash
    pub tx_hash: TxHash,
    /// Whether the transaction executed successfully
    pub success: bool,
}

/// The addresses produced by a successful diamond deployment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiamondDeployment {
    /// The diamond proxy
    pub proxy: Address,
    /// The owner the proxy was bound to
    pub owner: Address,
    /// The cut-authority facet the proxy was bound to
    pub cut_facet: Address,
    /// The initializer contract, if one was deployed
    pub initializer: Option<Address>,
    /// Auxiliary contracts, keyed by label
    pub auxiliaries: IndexMap<String, Address>,
    /// The facets installed by the cut
    pub facets: Vec<FacetDescriptor>,
    /// The hash of the cut transaction
    pub cut_tx: TxHash,
}

/// The result of upgrading an existing diamond
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiamondUpgrade {
    /// The upgraded proxy
    pub proxy: Address,
    /// The initializer contract, if one was deployed
    pub initializer: Option<Address>,
    /// Facets deployed for this upgrade
    pub facets: Vec<FacetDescriptor>,
    /// The applied cut records
    pub cuts: Vec<FacetCut>,
    /// The hash of the cut transaction
    pub cut_tx: TxHash,
}

/// A selector currently routed to a facet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// The facet address
    pub address: Address,
    /// A human-readable name for the facet
    pub facet: String,
}

/// A table of selector routes
pub type RouteTable = IndexMap<Selector, Route>;
