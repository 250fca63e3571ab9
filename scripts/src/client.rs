//! The chain capabilities the deployer consumes, and their alloy implementation

use std::time::Duration;

use alloy::{
    json_abi::Param,
    network::TransactionBuilder,
    primitives::{Address, Bytes, Selector, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use async_trait::async_trait;
use diamond_abi::IDiamondLoupe;
use tracing::debug;

use crate::{
    artifacts::ArtifactStore,
    constants::{DEFAULT_RECEIPT_POLL_ATTEMPTS, DEFAULT_RECEIPT_POLL_INTERVAL_MS},
    errors::ScriptError,
    types::CutReceipt,
};

/// Deploys contracts, submits transactions and awaits their receipts
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The address transactions are sent from
    fn sender(&self) -> Address;

    /// Deploy the named contract with ABI-encoded constructor arguments,
    /// returning once the deployment is confirmed
    async fn deploy(&self, contract: &str, constructor_args: Bytes)
        -> Result<Address, ScriptError>;

    /// Send a transaction calling `to` with `data`
    async fn submit(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError>;

    /// Wait until the transaction is mined
    async fn await_receipt(&self, tx_hash: TxHash) -> Result<CutReceipt, ScriptError>;

    /// The routes a deployed diamond currently serves, as reported by its loupe
    async fn facet_routes(
        &self,
        proxy: Address,
    ) -> Result<Vec<(Address, Vec<Selector>)>, ScriptError>;
}

/// Interface metadata of compiled contracts
pub trait ContractArtifacts: Send + Sync {
    /// The function signatures the contract exposes, in declaration order
    fn exposed_signatures(&self, contract: &str) -> Result<Vec<String>, ScriptError>;

    /// The parameters of the contract's constructor
    fn constructor_params(&self, contract: &str) -> Result<Vec<Param>, ScriptError>;
}

/// How long to wait for a transaction receipt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptPolling {
    /// The number of times to query for the receipt
    pub attempts: u32,
    /// The delay between queries
    pub interval: Duration,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RECEIPT_POLL_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
        }
    }
}

/// A [`ChainClient`] backed by an alloy provider with a local signer
#[derive(Clone)]
pub struct AlloyChainClient {
    /// The signing provider
    provider: DynProvider,
    /// The signer's address
    sender: Address,
    /// Where contract bytecode is read from
    artifacts: ArtifactStore,
    /// Receipt polling configuration
    polling: ReceiptPolling,
}

impl AlloyChainClient {
    /// Construct a client around a signing provider
    pub fn new(
        provider: DynProvider,
        sender: Address,
        artifacts: ArtifactStore,
        polling: ReceiptPolling,
    ) -> Self {
        Self {
            provider,
            sender,
            artifacts,
            polling,
        }
    }

    /// Poll for a receipt until it appears or the attempts run out
    async fn poll_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ScriptError> {
        // Fetching the receipt directly rather than watching the pending transaction,
        // which is unreliable against some dev nodes
        for attempt in 0..self.polling.attempts {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

            match receipt {
                Some(receipt) => return Ok(receipt),
                None => {
                    debug!(tx = %format!("{tx_hash:#x}"), attempt, "receipt not yet available");
                    tokio::time::sleep(self.polling.interval).await;
                }
            }
        }

        Err(ScriptError::ContractInteraction(format!(
            "no receipt for {tx_hash:#x} after {} attempts",
            self.polling.attempts
        )))
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(
        &self,
        contract: &str,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        let deployment_error = |reason: String| ScriptError::ContractDeployment {
            contract: contract.to_string(),
            reason,
        };

        let bytecode = self.artifacts.bytecode(contract)?;
        let code: Bytes = [&bytecode[..], &constructor_args[..]].concat().into();
        let tx = TransactionRequest::default().with_deploy_code(code);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| deployment_error(e.to_string()))?;
        let tx_hash = *pending.tx_hash();

        let receipt = self
            .poll_receipt(tx_hash)
            .await
            .map_err(|e| deployment_error(e.to_string()))?;
        if !receipt.status() {
            return Err(deployment_error(format!("deployment reverted: {tx_hash:#x}")));
        }

        receipt
            .contract_address
            .ok_or_else(|| deployment_error(format!("no contract address in receipt {tx_hash:#x}")))
    }

    async fn submit(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn await_receipt(&self, tx_hash: TxHash) -> Result<CutReceipt, ScriptError> {
        let receipt = self.poll_receipt(tx_hash).await?;
        Ok(CutReceipt {
            tx_hash,
            success: receipt.status(),
        })
    }

    async fn facet_routes(
        &self,
        proxy: Address,
    ) -> Result<Vec<(Address, Vec<Selector>)>, ScriptError> {
        let loupe = IDiamondLoupe::new(proxy, self.provider.clone());
        let facets = loupe
            .facets()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .facets_;

        Ok(facets
            .into_iter()
            .map(|facet| (facet.facetAddress, facet.functionSelectors))
            .collect())
    }
}
