#![deny(unused_crate_dependencies)]

mod cmd;

use chainkit_cli::{
    access_control::GrantCmd, contract_call::CallCmd, contract_deploy::DeployCmd,
    ownership::TransferOwnershipCmd, proxy::GetImplCmd, task_context::TaskContext,
};
use chainkit_common::toolkit_config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Parser)]
#[clap(bin_name = "chainkit", version)]
pub(crate) struct Opts {
    /// Path to the toolkit configuration file
    #[clap(
        long = "config",
        env = "CHAINKIT_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    config: PathBuf,

    /// Network to run against, the configured default when omitted
    #[clap(long = "network", env = "CHAINKIT_NETWORK", global = true)]
    network: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    #[command(name = "deploy", about = "Deploys, or upgrades, a contract.")]
    Deploy(DeployCmd),
    #[command(name = "get-impl", about = "Gets the implementation address of a proxy.")]
    GetImpl(GetImplCmd),
    #[command(name = "grant", about = "Grants or revokes a role.")]
    Grant(GrantCmd),
    #[command(
        name = "transfer-ownership",
        about = "Transfers ownership of a contract, or renounces ownership."
    )]
    TransferOwnership(TransferOwnershipCmd),
    #[command(name = "call", about = "Calls a contract function.")]
    Call(CallCmd),
    #[command(name = "gen-mnemonic", about = "Generates a random mnemonic.")]
    GenMnemonic(cmd::GenMnemonicCmd),
    #[command(name = "list-addresses", about = "Lists addresses derived from a mnemonic.")]
    ListAddresses(cmd::ListAddressesCmd),
    #[command(name = "sha3", about = "Hashes a string with keccak256.")]
    Sha3(cmd::Sha3Cmd),
}

impl Opts {
    fn context(&self) -> anyhow::Result<TaskContext> {
        Ok(TaskContext::load(&self.config, self.network.clone())?)
    }

    async fn exec(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Deploy(deploy_cmd) => deploy_cmd.exec(&self.context()?).await,
            Command::GetImpl(get_impl_cmd) => {
                get_impl_cmd.exec(&self.context()?).await
            }
            Command::Grant(grant_cmd) => grant_cmd.exec(&self.context()?).await,
            Command::TransferOwnership(ownership_cmd) => {
                ownership_cmd.exec(&self.context()?).await
            }
            Command::Call(call_cmd) => call_cmd.exec(&self.context()?).await,
            Command::GenMnemonic(gen_cmd) => gen_cmd.exec(),
            Command::ListAddresses(list_cmd) => list_cmd.exec(),
            Command::Sha3(sha3_cmd) => sha3_cmd.exec(),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    log::debug!("Running with config {}", opts.config.display());
    let exec_status = opts.exec().await;

    match exec_status {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err:?}");
            std::process::exit(1);
        }
    }
}
