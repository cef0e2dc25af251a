//! The seam between task logic and the JSON-RPC node.

use std::sync::Arc;

use chainkit_common::artifacts::Artifact;
use ethers::{
    abi::Token,
    contract::ContractFactory,
    providers::Middleware,
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes,
        TransactionReceipt, TransactionRequest, H256, U64,
    },
};

use crate::errors::TaskError;

/// Chain operations the tasks depend on. Every call is awaited to
/// completion before the next one starts.
#[allow(async_fn_in_trait)]
pub trait Chain {
    async fn chain_id(&self) -> Result<u64, TaskError>;

    /// Deploys `artifact` with ABI-encoded constructor `args` and returns
    /// the new contract address once the creation receipt is mined.
    async fn deploy(
        &self,
        artifact: &Artifact,
        args: Vec<Token>,
    ) -> Result<Address, TaskError>;

    /// Sends a state-changing call and waits for a successful receipt.
    async fn send(&self, to: Address, calldata: Bytes) -> Result<H256, TaskError>;

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, TaskError>;

    async fn storage_at(
        &self,
        address: Address,
        slot: H256,
    ) -> Result<H256, TaskError>;
}

/// Fails unless `receipt` reports a successful execution. Creation receipts
/// carry a `contract_address` even when the constructor reverted.
pub fn ensure_succeeded(
    receipt: &TransactionReceipt,
    action: &str,
) -> Result<(), TaskError> {
    if receipt.status != Some(U64::one()) {
        return Err(TaskError::Transaction(format!(
            "{} reverted, txn={:#x}",
            action, receipt.transaction_hash
        )));
    }
    Ok(())
}

/// [`Chain`] backed by an `ethers` middleware stack.
#[derive(Debug, Clone)]
pub struct EthersChain<M> {
    client: Arc<M>,
    confirmations: usize,
}

impl<M: Middleware + 'static> EthersChain<M> {
    pub fn new(client: Arc<M>, confirmations: usize) -> Self {
        Self { client, confirmations: confirmations.max(1) }
    }

    pub fn client(&self) -> &Arc<M> {
        &self.client
    }
}

impl<M: Middleware + 'static> Chain for EthersChain<M> {
    async fn chain_id(&self) -> Result<u64, TaskError> {
        self.client
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|err_code| {
                TaskError::Transaction(format!(
                    "Unable to fetch chain id :: {}",
                    err_code
                ))
            })
    }

    async fn deploy(
        &self,
        artifact: &Artifact,
        args: Vec<Token>,
    ) -> Result<Address, TaskError> {
        artifact.ensure_deployable()?;

        let factory = ContractFactory::new(
            artifact.abi.clone(),
            artifact.bytecode.clone(),
            self.client.clone(),
        );

        let deployer = factory
            .deploy_tokens(args)
            .map_err(|err_code| {
                TaskError::Transaction(format!(
                    "Unable to build {} deployment :: {}",
                    artifact.contract_name, err_code
                ))
            })?
            .confirmations(self.confirmations);

        let (contract, receipt) =
            deployer.send_with_receipt().await.map_err(|err_code| {
                TaskError::Transaction(format!(
                    "Deployment of {} failed :: {}",
                    artifact.contract_name, err_code
                ))
            })?;
        ensure_succeeded(
            &receipt,
            &format!("Deployment of {}", artifact.contract_name),
        )?;

        log::info!(
            "{} deployment txn={:#x} block={:?} gas_used={:?}",
            artifact.contract_name,
            receipt.transaction_hash,
            receipt.block_number,
            receipt.gas_used
        );

        Ok(contract.address())
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<H256, TaskError> {
        let tx = TransactionRequest::new().to(to).data(calldata);

        let pending = self.client.send_transaction(tx, None).await.map_err(
            |err_code| {
                TaskError::Transaction(format!(
                    "Unable to submit txn to {:#x} :: {}",
                    to, err_code
                ))
            },
        )?;
        let tx_hash = *pending;

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|err_code| {
                TaskError::Transaction(format!(
                    "Txn {:#x} failed :: {}",
                    tx_hash, err_code
                ))
            })?
            .ok_or_else(|| {
                TaskError::Transaction(format!(
                    "Txn {:#x} was dropped from the mempool",
                    tx_hash
                ))
            })?;

        ensure_succeeded(&receipt, &format!("Call to {:#x}", to))?;
        Ok(tx_hash)
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, TaskError> {
        let tx: TypedTransaction =
            TransactionRequest::new().to(to).data(calldata).into();

        self.client.call(&tx, None).await.map_err(|err_code| {
            TaskError::Transaction(format!(
                "Call to {:#x} failed :: {}",
                to, err_code
            ))
        })
    }

    async fn storage_at(
        &self,
        address: Address,
        slot: H256,
    ) -> Result<H256, TaskError> {
        self.client.get_storage_at(address, slot, None).await.map_err(
            |err_code| {
                TaskError::Transaction(format!(
                    "Unable to read slot {:#x} of {:#x} :: {}",
                    slot, address, err_code
                ))
            },
        )
    }
}
