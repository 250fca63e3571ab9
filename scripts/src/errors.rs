//! Definitions of errors that can occur during the execution of the diamond deploy scripts

use alloy::primitives::{Address, Selector, TxHash};
use thiserror::Error;

use crate::types::UpgradeStage;

/// Errors that can occur during the execution of the diamond deploy scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A function signature could not be parsed into canonical form
    #[error("malformed function signature `{signature}`: {reason}")]
    MalformedSignature {
        /// The signature as given by the caller
        signature: String,
        /// Why the signature was rejected
        reason: String,
    },
    /// A signature named in a selector override is not present in the set
    #[error("selector {selector} for `{signature}` not found")]
    SelectorNotFound {
        /// The canonical signature that was looked up
        signature: String,
        /// The selector derived from the signature
        selector: Selector,
    },
    /// The same selector would be routed to two facets in one upgrade
    #[error(
        "selector {selector} (`{signature}`) is claimed by both {first_facet} ({first:#x}) and {second_facet} ({second:#x})"
    )]
    SelectorCollision {
        /// The colliding selector
        selector: Selector,
        /// The canonical signature of the selector in the second facet
        signature: String,
        /// The address the selector is already routed to
        first: Address,
        /// The name of the facet the selector is already routed to
        first_facet: String,
        /// The address of the facet that also claims the selector
        second: Address,
        /// The name of the facet that also claims the selector
        second_facet: String,
    },
    /// Two distinct signatures hash to the same selector
    #[error("signatures `{first}` and `{second}` share selector {selector}")]
    SelectorClash {
        /// The shared selector
        selector: Selector,
        /// The first canonical signature
        first: String,
        /// The second canonical signature
        second: String,
    },
    /// A cut record would carry no selectors
    #[error("facet cut for {facet} has no selectors")]
    EmptyFacetCut {
        /// The name of the facet
        facet: String,
    },
    /// Error deploying a contract
    #[error("error deploying {contract}: {reason}")]
    ContractDeployment {
        /// The name of the contract being deployed
        contract: String,
        /// The chain-reported reason, verbatim
        reason: String,
    },
    /// The diamond cut transaction was mined but reverted
    #[error("diamond upgrade failed: {tx_hash:#x}")]
    UpgradeFailed {
        /// The hash of the reverted transaction
        tx_hash: TxHash,
    },
    /// The deployer was asked to start a run from a stage other than `Unstarted`
    #[error("cannot start a run from stage {0:?}")]
    InvalidStage(UpgradeStage),
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    #[error("error constructing calldata: {0}")]
    CalldataConstruction(String),
    /// Error calling a contract method or submitting a transaction
    #[error("error interacting with contract: {0}")]
    ContractInteraction(String),
    /// Error parsing a Solidity compilation artifact
    #[error("error parsing artifact: {0}")]
    ArtifactParsing(String),
    /// Error reading a deployment plan
    #[error("error reading config: {0}")]
    ReadConfig(String),
    /// A deployment plan is well-formed JSON but not a valid plan
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Error reading the `deployments.json` file
    #[error("error reading deployments: {0}")]
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    #[error("error writing deployments: {0}")]
    WriteDeployments(String),
}

impl ScriptError {
    /// Whether the error was raised before anything was submitted to the chain
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            ScriptError::MalformedSignature { .. }
                | ScriptError::SelectorNotFound { .. }
                | ScriptError::SelectorCollision { .. }
                | ScriptError::SelectorClash { .. }
                | ScriptError::EmptyFacetCut { .. }
        )
    }
}
