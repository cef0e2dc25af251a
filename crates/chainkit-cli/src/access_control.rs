//! Grants and revokes access-control roles.
//!
//! Usage:
//!
//! ```text
//! # Grant a role to a user.
//! chainkit grant \
//!     --address 0x11CED8aA8d02848429aF8dae3eC9F0796ba2db91 \
//!     --role AUTHORIZER \
//!     --actor 0xB4ce9cb1788dCd15969Ba01573516F6fBf7dA51c \
//!     --network localhost
//!
//! # Revoke a previously granted role.
//! chainkit grant \
//!     --address 0x11CED8aA8d02848429aF8dae3eC9F0796ba2db91 \
//!     --role AUTHORIZER \
//!     --actor 0xB4ce9cb1788dCd15969Ba01573516F6fBf7dA51c \
//!     --network localhost \
//!     --revoke
//! ```

use ethers::{
    abi::{AbiDecode, AbiEncode},
    types::{Address, H256},
};

use crate::{
    bindings::{GrantRoleCall, HasRoleCall, HasRoleReturn, RevokeRoleCall},
    chain::Chain,
    checksum,
    errors::TaskError,
    task_context::TaskContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Grant,
    Revoke,
}

/// A role change to apply to an AccessControl contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub contract: Address,
    pub role: String,
    pub actor: Address,
    pub action: RoleAction,
}

impl RoleChange {
    /// `keccak256` of the role name, as `AccessControl` identifies roles.
    pub fn role_id(&self) -> H256 {
        chainkit_common::id(&self.role)
    }

    pub async fn apply<C: Chain>(&self, chain: &C) -> Result<H256, TaskError> {
        let role = self.role_id().0;
        let calldata = match self.action {
            RoleAction::Grant => {
                GrantRoleCall { role, account: self.actor }.encode()
            }
            RoleAction::Revoke => {
                RevokeRoleCall { role, account: self.actor }.encode()
            }
        };
        let tx_hash = chain.send(self.contract, calldata.into()).await?;

        self.check_applied(chain).await;
        Ok(tx_hash)
    }

    /// Reads `hasRole` back. Contracts without it only get a warning.
    async fn check_applied<C: Chain>(&self, chain: &C) {
        let calldata =
            HasRoleCall { role: self.role_id().0, account: self.actor }.encode();

        let has_role = match chain.call(self.contract, calldata.into()).await {
            Ok(raw) => HasRoleReturn::decode(&raw).map(|ret| ret.0).ok(),
            Err(_) => None,
        };

        match (has_role, self.action) {
            (Some(true), RoleAction::Grant) | (Some(false), RoleAction::Revoke) => {
                log::debug!("hasRole check passed for {:#x}", self.actor)
            }
            (Some(_), _) => log::warn!(
                "hasRole({}, {:#x}) on {:#x} does not reflect the {:?}",
                self.role,
                self.actor,
                self.contract,
                self.action
            ),
            (None, _) => log::warn!(
                "Unable to read hasRole on {:#x}, role change not confirmed",
                self.contract
            ),
        }
    }
}

/// Grants or revokes a role
#[derive(Clone, Debug, clap::Args)]
#[clap(name = "grant")]
pub struct GrantCmd {
    /// Address of the contract to grant access to
    #[clap(long = "address")]
    address: Address,

    /// Address of the actor to grant or revoke access
    #[clap(long = "actor")]
    actor: Address,

    /// String to keccak256 to get the role identifier
    #[clap(long = "role")]
    role: String,

    /// Revoke instead of granting the role
    #[clap(long = "revoke", default_value_t = false)]
    revoke: bool,

    /// Indicates the contract is upgradeable
    #[clap(long = "upgradeable", default_value_t = false)]
    upgradeable: bool,
}

impl GrantCmd {
    pub fn change(&self) -> RoleChange {
        RoleChange {
            contract: self.address,
            role: self.role.clone(),
            actor: self.actor,
            action: if self.revoke { RoleAction::Revoke } else { RoleAction::Grant },
        }
    }

    pub async fn exec(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        let change = self.change();
        let chain = ctx.connect().await?;
        log::info!(
            "Using {} interface at {:#x}",
            interface_name(self.upgradeable),
            self.address
        );

        let tx_hash = change.apply(&chain).await?;
        println!("{}", describe(&change, tx_hash));
        Ok(())
    }
}

fn interface_name(upgradeable: bool) -> &'static str {
    if upgradeable {
        "AccessControlUpgradeable"
    } else {
        "AccessControl"
    }
}

pub fn describe(change: &RoleChange, tx_hash: H256) -> String {
    let (verb, preposition) = match change.action {
        RoleAction::Grant => ("Grant", "to"),
        RoleAction::Revoke => ("Revoke", "from"),
    };
    format!(
        "{} role {} ({:#x}) {} address {} (for contract at {}), txn={:#x}",
        verb,
        change.role,
        change.role_id(),
        preposition,
        checksum(&change.actor),
        checksum(&change.contract),
        tx_hash
    )
}
