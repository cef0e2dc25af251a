//! EIP-1967 proxy deployment, upgrade and inspection.

use chainkit_common::{
    artifacts::{Artifact, ArtifactStore},
    params::{coerce_params, ParamValue},
    primitives::{address_from_slot, admin_slot, implementation_slot},
    toolkit_config::ProxyArtifactNames,
};
use ethers::{
    abi::{Abi, AbiEncode, Token},
    types::{Address, Bytes, H256},
};

use crate::{
    bindings::{UpgradeCall, UpgradeToCall},
    chain::Chain,
    checksum,
    errors::TaskError,
    task_context::TaskContext,
};

/// Proxy flavour used for upgradeable deployments.
///
/// Both flavours expect the OpenZeppelin Contracts 4.x proxies: upgrades go
/// through `ProxyAdmin.upgrade(proxy, impl)` or `upgradeTo(impl)`, which 5.x
/// replaced with `upgradeAndCall` / `upgradeToAndCall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ProxyKind {
    /// OZ 4.x `TransparentUpgradeableProxy` administered by a `ProxyAdmin`.
    Transparent,
    /// OZ 4.x `ERC1967Proxy` whose implementation carries `upgradeTo`.
    Uups,
}

impl std::fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transparent => write!(f, "transparent"),
            Self::Uups => write!(f, "uups"),
        }
    }
}

pub async fn implementation_address<C: Chain>(
    chain: &C,
    proxy: Address,
) -> Result<Address, TaskError> {
    let word = chain.storage_at(proxy, implementation_slot()).await?;
    Ok(address_from_slot(word))
}

pub async fn admin_address<C: Chain>(
    chain: &C,
    proxy: Address,
) -> Result<Address, TaskError> {
    let word = chain.storage_at(proxy, admin_slot()).await?;
    Ok(address_from_slot(word))
}

/// Calldata for the proxy's one-time initializer call.
///
/// Without params and without an `initializer` function the proxy is
/// deployed with empty calldata; params without a matching function are
/// an error.
pub fn initializer_calldata(
    abi: &Abi,
    initializer: &str,
    values: &[ParamValue],
) -> Result<(Bytes, Vec<Token>), TaskError> {
    let function = match abi.function(initializer) {
        Ok(function) => function,
        Err(_) if values.is_empty() => return Ok((Bytes::new(), Vec::new())),
        Err(_) => {
            return Err(TaskError::Argument(format!(
                "Params supplied but contract has no '{}' initializer",
                initializer
            )))
        }
    };

    let tokens = coerce_params(&function.inputs, values)?;
    let calldata = function.encode_input(&tokens).map_err(|err_code| {
        TaskError::Argument(format!(
            "Unable to encode {} call :: {}",
            initializer, err_code
        ))
    })?;

    Ok((Bytes::from(calldata), tokens))
}

/// Deploys a proxy of `kind` in front of `implementation`, running
/// `init_data` through it. Returns the proxy address.
pub async fn deploy_proxy<C: Chain>(
    chain: &C,
    artifacts: &ArtifactStore,
    names: &ProxyArtifactNames,
    kind: ProxyKind,
    implementation: Address,
    init_data: Bytes,
) -> Result<Address, TaskError> {
    match kind {
        ProxyKind::Transparent => {
            let admin_artifact = artifacts.resolve(&names.admin)?;
            let proxy_artifact = artifacts.resolve(&names.transparent)?;

            let admin = chain.deploy(&admin_artifact, Vec::new()).await?;
            log::info!("{} deployed to: {:#x}", names.admin, admin);

            chain
                .deploy(
                    &proxy_artifact,
                    vec![
                        Token::Address(implementation),
                        Token::Address(admin),
                        Token::Bytes(init_data.to_vec()),
                    ],
                )
                .await
        }
        ProxyKind::Uups => {
            let proxy_artifact: Artifact = artifacts.resolve(&names.uups)?;
            chain
                .deploy(
                    &proxy_artifact,
                    vec![
                        Token::Address(implementation),
                        Token::Bytes(init_data.to_vec()),
                    ],
                )
                .await
        }
    }
}

/// Points `proxy` at `new_implementation`. Transparent proxies are upgraded
/// through the admin recorded in the EIP-1967 admin slot.
pub async fn upgrade_proxy<C: Chain>(
    chain: &C,
    kind: ProxyKind,
    proxy: Address,
    new_implementation: Address,
) -> Result<H256, TaskError> {
    match kind {
        ProxyKind::Transparent => {
            let admin = admin_address(chain, proxy).await?;
            if admin.is_zero() {
                return Err(TaskError::Argument(format!(
                    "{:#x} has no proxy admin, is it a transparent proxy?",
                    proxy
                )));
            }
            log::info!("Upgrading {:#x} through admin {:#x}", proxy, admin);

            let calldata = UpgradeCall {
                proxy,
                implementation: new_implementation,
            }
            .encode();
            chain.send(admin, calldata.into()).await
        }
        ProxyKind::Uups => {
            let calldata = UpgradeToCall { new_implementation }.encode();
            chain.send(proxy, calldata.into()).await
        }
    }
}

pub fn describe_implementation(proxy: Address, implementation: Address) -> String {
    format!("Proxy {} impl {}", checksum(&proxy), checksum(&implementation))
}

/// Prints the implementation address behind a proxy
#[derive(Clone, Debug, clap::Args)]
#[clap(name = "get-impl")]
pub struct GetImplCmd {
    /// Address of the proxy contract
    #[clap(long = "address")]
    address: Address,
}

impl GetImplCmd {
    pub async fn exec(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        let chain = ctx.connect_read_only()?;
        let implementation = implementation_address(&chain, self.address).await?;
        println!("{}", describe_implementation(self.address, implementation));
        Ok(())
    }
}
