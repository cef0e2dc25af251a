//! Transfers or renounces contract ownership.

use ethers::{
    abi::AbiEncode,
    types::{Address, H256},
};

use crate::{
    bindings::{RenounceOwnershipCall, TransferOwnershipCall},
    chain::Chain,
    checksum,
    errors::TaskError,
    task_context::TaskContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipAction {
    Renounce,
    Transfer { new_owner: Address },
}

impl OwnershipAction {
    /// Checked before any network access.
    pub fn from_flags(
        renounce: bool,
        new_owner: Option<Address>,
    ) -> Result<Self, TaskError> {
        match (renounce, new_owner) {
            (true, Some(_)) => Err(TaskError::Argument(
                "Cannot provide newOwner when revoking ownership.".to_string(),
            )),
            (true, None) => Ok(OwnershipAction::Renounce),
            (false, Some(new_owner)) => {
                Ok(OwnershipAction::Transfer { new_owner })
            }
            (false, None) => Err(TaskError::Argument(
                "Must provide newOwner when transferring ownership.".to_string(),
            )),
        }
    }

    pub async fn apply<C: Chain>(
        &self,
        chain: &C,
        contract: Address,
    ) -> Result<H256, TaskError> {
        let calldata = match self {
            OwnershipAction::Renounce => RenounceOwnershipCall.encode(),
            OwnershipAction::Transfer { new_owner } => {
                TransferOwnershipCall { new_owner: *new_owner }.encode()
            }
        };
        chain.send(contract, calldata.into()).await
    }

    pub fn describe(&self, contract: Address, tx_hash: H256) -> String {
        match self {
            OwnershipAction::Renounce => format!(
                "Renounced ownership of contract at {}, txn={:#x}",
                checksum(&contract),
                tx_hash
            ),
            OwnershipAction::Transfer { new_owner } => format!(
                "Transferred ownership of contract at {} to {}, txn={:#x}",
                checksum(&contract),
                checksum(new_owner),
                tx_hash
            ),
        }
    }
}

/// Transfers ownership of a contract, or renounces ownership
#[derive(Clone, Debug, clap::Args)]
#[clap(name = "transfer-ownership")]
pub struct TransferOwnershipCmd {
    /// Address of the owned contract
    #[clap(long = "address")]
    address: Address,

    /// Renounce instead of transferring ownership
    #[clap(long = "renounce", default_value_t = false)]
    renounce: bool,

    /// Indicates the contract is upgradeable
    #[clap(long = "upgradeable", default_value_t = false)]
    upgradeable: bool,

    /// Address that will receive ownership
    #[clap(long = "new-owner")]
    new_owner: Option<Address>,
}

impl TransferOwnershipCmd {
    pub async fn exec(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        let action = OwnershipAction::from_flags(self.renounce, self.new_owner)?;

        let chain = ctx.connect().await?;
        log::info!(
            "Using {} interface at {:#x}",
            if self.upgradeable { "OwnableUpgradeable" } else { "Ownable" },
            self.address
        );

        let tx_hash = action.apply(&chain, self.address).await?;
        println!("{}", action.describe(self.address, tx_hash));
        Ok(())
    }
}
