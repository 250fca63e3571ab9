//! Progress events emitted while deploying or upgrading a diamond

use alloy::primitives::{Address, TxHash};
use itertools::Itertools;
use tracing::{error, info};

use crate::types::{CutAction, UpgradeStage};

/// A progress event of a deploy or upgrade run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeployEvent {
    /// The run moved to a new stage
    StageChanged {
        /// The previous stage
        from: UpgradeStage,
        /// The new stage
        to: UpgradeStage,
    },
    /// A contract deployment was sent
    DeploymentStarted {
        /// The label of the contract
        contract: String,
    },
    /// A contract deployment was confirmed
    DeploymentCompleted {
        /// The label of the contract
        contract: String,
        /// The deployed address
        address: Address,
    },
    /// A cut record was resolved
    CutRecordResolved {
        /// The facet name
        facet: String,
        /// The facet address, zero for removals
        address: Address,
        /// The cut action
        action: CutAction,
        /// The canonical signatures of the record's selectors
        signatures: Vec<String>,
    },
    /// The full cut list was built and checked
    CutBuilt {
        /// The number of cut records
        records: usize,
        /// The total number of selectors across all records
        selectors: usize,
    },
    /// The cut transaction was submitted
    TransactionSubmitted {
        /// The transaction hash
        tx_hash: TxHash,
    },
    /// The cut transaction succeeded
    TransactionConfirmed {
        /// The transaction hash
        tx_hash: TxHash,
    },
    /// The cut transaction reverted
    TransactionFailed {
        /// The transaction hash
        tx_hash: TxHash,
    },
}

/// A consumer of progress events
pub trait EventSink: Send + Sync {
    /// Handle a single event
    fn emit(&self, event: DeployEvent);
}

impl<F: Fn(DeployEvent) + Send + Sync> EventSink for F {
    fn emit(&self, event: DeployEvent) {
        self(event)
    }
}

/// Writes events to the `tracing` subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DeployEvent) {
        match event {
            DeployEvent::StageChanged { from, to } => {
                info!(?from, ?to, "stage changed")
            }
            DeployEvent::DeploymentStarted { contract } => {
                info!(%contract, "deploying")
            }
            DeployEvent::DeploymentCompleted { contract, address } => {
                info!(%contract, address = %format!("{address:#x}"), "deployed")
            }
            DeployEvent::CutRecordResolved {
                facet,
                address,
                action,
                signatures,
            } => info!(
                %facet,
                address = %format!("{address:#x}"),
                %action,
                signatures = %signatures.iter().join(", "),
                "facet cut"
            ),
            DeployEvent::CutBuilt { records, selectors } => {
                info!(records, selectors, "diamond cut built")
            }
            DeployEvent::TransactionSubmitted { tx_hash } => {
                info!(tx = %format!("{tx_hash:#x}"), "diamond cut submitted")
            }
            DeployEvent::TransactionConfirmed { tx_hash } => {
                info!(tx = %format!("{tx_hash:#x}"), "completed diamond cut")
            }
            DeployEvent::TransactionFailed { tx_hash } => {
                error!(tx = %format!("{tx_hash:#x}"), "diamond upgrade failed")
            }
        }
    }
}
