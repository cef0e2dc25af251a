//! Deploys and upgrades contracts.
//!
//! Usage:
//!
//! ```text
//! # Deploy a contract with no constructor params
//! chainkit deploy --contract SignatureValidator --network localhost
//!
//! # Deploy an upgradeable contract with no initializer params
//! chainkit deploy --contract ArtToken --upgradeable --network localhost
//!
//! # Deploy a contract with constructor params
//! chainkit deploy \
//!     --contract RoyaltySplitter \
//!     --params '["0x6047Ac71f35aD757eBEc74aDA7Ee0Ae147740247", []]' \
//!     --network localhost
//!
//! # Upgrade the proxy at a given address
//! chainkit deploy \
//!     --contract ArtTokenV2 \
//!     --upgradeable \
//!     --address 0x0093b0c1a5df2711576A58942694E80BCC73CeDc \
//!     --network localhost
//! ```

use chainkit_common::{
    artifacts::{Artifact, ArtifactStore},
    params::{coerce_params, parse_params, ParamValue},
    toolkit_config::ProxyArtifactNames,
};
use ethers::{abi::Token, types::Address};

use crate::{
    chain::Chain,
    checksum,
    errors::TaskError,
    proxy::{
        deploy_proxy, implementation_address, initializer_calldata,
        upgrade_proxy, ProxyKind,
    },
    task_context::TaskContext,
    verify::{VerificationOutcome, VerificationRequest, Verifier},
};

/// What a deploy invocation does, fixed before any network access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Deploy a plain contract, params go to its constructor.
    Deploy,
    /// Deploy an implementation behind a new proxy, params go to the initializer.
    DeployProxy,
    /// Replace the implementation behind an existing proxy.
    UpgradeProxy { proxy: Address },
    /// Verify an already deployed, non-proxied contract.
    VerifyExisting { address: Address },
}

impl DeployPlan {
    pub fn select(
        address: Option<Address>,
        upgradeable: bool,
        verify: bool,
    ) -> Result<Self, TaskError> {
        match (address, upgradeable) {
            (Some(proxy), true) => Ok(DeployPlan::UpgradeProxy { proxy }),
            (None, true) => Ok(DeployPlan::DeployProxy),
            (None, false) => Ok(DeployPlan::Deploy),
            (Some(address), false) if verify => {
                Ok(DeployPlan::VerifyExisting { address })
            }
            (Some(address), false) => Err(TaskError::Argument(format!(
                "--address {:#x} needs --upgradeable to upgrade a proxy, or --verify to verify an existing contract",
                address
            ))),
        }
    }

    pub fn is_upgradeable(&self) -> bool {
        matches!(self, DeployPlan::DeployProxy | DeployPlan::UpgradeProxy { .. })
    }
}

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub contract: String,
    pub plan: DeployPlan,
    pub params: Vec<ParamValue>,
    pub verify: bool,
    pub kind: ProxyKind,
    pub initializer: String,
}

impl DeployRequest {
    pub fn new(
        contract: String,
        plan: DeployPlan,
        params: Vec<ParamValue>,
        verify: bool,
        kind: ProxyKind,
        initializer: String,
    ) -> Result<Self, TaskError> {
        if matches!(plan, DeployPlan::UpgradeProxy { .. }) && !params.is_empty()
        {
            return Err(TaskError::Argument(
                "Upgrades do not run an initializer, drop --params".to_string(),
            ));
        }

        Ok(Self { contract, plan, params, verify, kind, initializer })
    }
}

/// The reconstructed deployment record of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    pub contract: String,
    /// Contract address, or the proxy address for upgradeable deployments.
    pub address: Address,
    pub implementation: Option<Address>,
    pub upgradeable: bool,
    /// Constructor or initializer arguments as sent.
    pub params: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationReport {
    Skipped,
    Completed(VerificationOutcome),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployReport {
    pub record: DeploymentRecord,
    pub verification: VerificationReport,
}

pub struct DeployWorkflow<'a, C, V> {
    chain: &'a C,
    verifier: Option<&'a V>,
    artifacts: &'a ArtifactStore,
    proxy_names: &'a ProxyArtifactNames,
}

impl<'a, C: Chain, V: Verifier> DeployWorkflow<'a, C, V> {
    pub fn new(
        chain: &'a C,
        artifacts: &'a ArtifactStore,
        proxy_names: &'a ProxyArtifactNames,
    ) -> Self {
        Self { chain, verifier: None, artifacts, proxy_names }
    }

    pub fn with_verifier(mut self, verifier: &'a V) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub async fn run(
        &self,
        request: &DeployRequest,
    ) -> Result<DeployReport, TaskError> {
        if request.verify && self.verifier.is_none() {
            return Err(TaskError::Config(
                "Verification requested but no verifier is configured"
                    .to_string(),
            ));
        }

        let artifact = self.artifacts.resolve(&request.contract)?;

        let (address, params) = match &request.plan {
            DeployPlan::Deploy => self.deploy(&artifact, request).await?,
            DeployPlan::DeployProxy => {
                self.deploy_proxied(&artifact, request).await?
            }
            DeployPlan::UpgradeProxy { proxy } => {
                self.upgrade(&artifact, request, *proxy).await?
            }
            DeployPlan::VerifyExisting { address } => {
                let params = constructor_tokens(&artifact, &request.params)?;
                (*address, params)
            }
        };

        let upgradeable = request.plan.is_upgradeable();
        let implementation = if upgradeable {
            let implementation =
                implementation_address(self.chain, address).await?;
            println!(
                "{} (impl) deployed to: {}",
                checksum(&address),
                checksum(&implementation)
            );
            Some(implementation)
        } else {
            None
        };

        let record = DeploymentRecord {
            contract: request.contract.clone(),
            address,
            implementation,
            upgradeable,
            params,
        };

        let verification = match self.verifier {
            Some(verifier) if request.verify => {
                self.verify(verifier, &artifact, &record).await
            }
            _ => VerificationReport::Skipped,
        };

        println!("Deploy complete.");
        Ok(DeployReport { record, verification })
    }

    async fn deploy(
        &self,
        artifact: &Artifact,
        request: &DeployRequest,
    ) -> Result<(Address, Vec<Token>), TaskError> {
        let params = constructor_tokens(artifact, &request.params)?;

        println!("Deploying contract {}", request.contract);
        let address = self.chain.deploy(artifact, params.clone()).await?;
        println!("{} deployed to: {}", request.contract, checksum(&address));

        Ok((address, params))
    }

    async fn deploy_proxied(
        &self,
        artifact: &Artifact,
        request: &DeployRequest,
    ) -> Result<(Address, Vec<Token>), TaskError> {
        ensure_argless_constructor(artifact)?;
        let (init_data, params) = initializer_calldata(
            &artifact.abi,
            &request.initializer,
            &request.params,
        )?;

        println!("Deploying contract {}", request.contract);
        let implementation = self.chain.deploy(artifact, Vec::new()).await?;
        log::info!(
            "{} implementation deployed to: {:#x}",
            request.contract,
            implementation
        );

        let proxy = deploy_proxy(
            self.chain,
            self.artifacts,
            self.proxy_names,
            request.kind,
            implementation,
            init_data,
        )
        .await?;
        println!("{} deployed to: {}", request.contract, checksum(&proxy));

        Ok((proxy, params))
    }

    async fn upgrade(
        &self,
        artifact: &Artifact,
        request: &DeployRequest,
        proxy: Address,
    ) -> Result<(Address, Vec<Token>), TaskError> {
        ensure_argless_constructor(artifact)?;
        println!("Upgrading {} at: {}", request.contract, checksum(&proxy));

        let previous = implementation_address(self.chain, proxy).await?;
        log::info!("Current implementation of {:#x} is {:#x}", proxy, previous);

        let implementation = self.chain.deploy(artifact, Vec::new()).await?;
        let tx_hash =
            upgrade_proxy(self.chain, request.kind, proxy, implementation)
                .await?;
        log::info!(
            "Upgraded {:#x} ({} proxy) to {:#x}, txn={:#x}",
            proxy,
            request.kind,
            implementation,
            tx_hash
        );

        Ok((proxy, Vec::new()))
    }

    /// Proxied deployments are verified at the implementation, which holds
    /// the bytecode; direct ones at their own address with the exact
    /// constructor arguments.
    async fn verify(
        &self,
        verifier: &V,
        artifact: &Artifact,
        record: &DeploymentRecord,
    ) -> VerificationReport {
        let request = match record.implementation {
            Some(implementation) => VerificationRequest {
                address: implementation,
                constructor_args: Vec::new(),
            },
            None => VerificationRequest {
                address: record.address,
                constructor_args: record.params.clone(),
            },
        };

        println!("Verifying contract at {}", checksum(&request.address));
        match verifier.verify(artifact, &request).await {
            Ok(outcome) => {
                log::info!(
                    "Verification of {} at {:#x} :: {:?}",
                    record.contract,
                    request.address,
                    outcome
                );
                VerificationReport::Completed(outcome)
            }
            Err(err_code) => {
                log::error!(
                    "Verification of {} at {:#x} failed :: {}",
                    record.contract,
                    request.address,
                    err_code
                );
                VerificationReport::Failed(err_code.to_string())
            }
        }
    }
}

fn constructor_tokens(
    artifact: &Artifact,
    values: &[ParamValue],
) -> Result<Vec<Token>, TaskError> {
    let inputs = artifact
        .abi
        .constructor()
        .map(|constructor| constructor.inputs.as_slice())
        .unwrap_or_default();
    Ok(coerce_params(inputs, values)?)
}

fn ensure_argless_constructor(artifact: &Artifact) -> Result<(), TaskError> {
    match artifact.abi.constructor() {
        Some(constructor) if !constructor.inputs.is_empty() => {
            Err(TaskError::Argument(format!(
                "{} takes constructor arguments and cannot sit behind a proxy",
                artifact.contract_name
            )))
        }
        _ => Ok(()),
    }
}

/// Deploy, deploy behind a proxy, or upgrade a contract
#[derive(Clone, Debug, clap::Args)]
#[clap(name = "deploy")]
pub struct DeployCmd {
    /// Name of the contract to deploy
    #[clap(long = "contract")]
    contract: String,

    /// Address of the proxy to upgrade, or of the contract to verify
    #[clap(long = "address")]
    address: Option<Address>,

    /// JSON params to the constructor or initializer
    #[clap(long = "params", default_value = "[]")]
    params: String,

    /// Deploy or upgrade behind a proxy
    #[clap(long = "upgradeable", default_value_t = false)]
    upgradeable: bool,

    /// Verify the source on the block explorer afterwards
    #[clap(long = "verify", default_value_t = false)]
    verify: bool,

    /// Proxy flavour for upgradeable deployments (OpenZeppelin 4.x proxies)
    #[clap(long = "kind", value_enum, default_value_t = ProxyKind::Transparent)]
    kind: ProxyKind,

    /// Initializer function run through the proxy on deployment
    #[clap(long = "initializer", default_value = "initialize")]
    initializer: String,
}

impl DeployCmd {
    pub async fn exec(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        log::info!("Contract Deploy With Args :: {:#?}", &self);

        let params = parse_params(&self.params).map_err(TaskError::from)?;
        let plan = DeployPlan::select(self.address, self.upgradeable, self.verify)?;
        let request = DeployRequest::new(
            self.contract.clone(),
            plan,
            params,
            self.verify,
            self.kind,
            self.initializer.clone(),
        )?;

        let chain = ctx.connect().await?;
        let verifier = if self.verify {
            Some(ctx.verifier(chain.chain_id().await?)?)
        } else {
            None
        };

        let artifacts = ctx.artifacts();
        let mut workflow =
            DeployWorkflow::new(&chain, &artifacts, &ctx.settings().proxy);
        if let Some(verifier) = verifier.as_ref() {
            workflow = workflow.with_verifier(verifier);
        }

        let report = workflow.run(&request).await?;
        if let VerificationReport::Failed(reason) = report.verification {
            return Err(TaskError::Verification(reason).into());
        }

        Ok(())
    }
}
