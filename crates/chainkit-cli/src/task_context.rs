//! Runtime context shared by the network-facing commands.

use std::{path::Path, sync::Arc};

use chainkit_common::{
    artifacts::ArtifactStore,
    toolkit_config::{self, Network, Settings},
};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
};

use crate::{chain::EthersChain, errors::TaskError, verify::EtherscanVerifier};

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Debug, Clone)]
pub struct TaskContext {
    settings: Settings,
    network_name: String,
}

impl TaskContext {
    /// Loads settings and selects `network`, or the configured default.
    pub fn load(
        config_path: &Path,
        network: Option<String>,
    ) -> Result<Self, TaskError> {
        let settings = toolkit_config::load_settings(config_path)?;
        Ok(Self::new(settings, network))
    }

    pub fn new(settings: Settings, network: Option<String>) -> Self {
        let network_name =
            network.unwrap_or_else(|| settings.default_network.clone());
        Self { settings, network_name }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    pub fn network(&self) -> Result<&Network, TaskError> {
        Ok(self.settings.network(&self.network_name)?)
    }

    pub fn artifacts(&self) -> ArtifactStore {
        ArtifactStore::new(&self.settings.artifacts)
    }

    fn provider(&self) -> Result<Provider<Http>, TaskError> {
        let network = self.network()?;
        Provider::<Http>::try_from(network.url.as_str()).map_err(|err_code| {
            TaskError::Config(format!(
                "Invalid RPC url for network {} :: {}",
                self.network_name, err_code
            ))
        })
    }

    /// A chain handle without a signer, for reads.
    pub fn connect_read_only(&self) -> Result<EthersChain<Provider<Http>>, TaskError> {
        let network = self.network()?;
        log::info!("Using network {} ({})", self.network_name, network.url);
        Ok(EthersChain::new(Arc::new(self.provider()?), network.confirmations))
    }

    /// A signing chain handle using the network's configured account.
    pub async fn connect(&self) -> Result<EthersChain<SignerClient>, TaskError> {
        let network = self.network()?;
        let provider = self.provider()?;
        let wallet = network.wallet(&self.network_name)?;

        let chain_id = match network.chain_id {
            Some(chain_id) => chain_id,
            None => provider
                .get_chainid()
                .await
                .map_err(|err_code| {
                    TaskError::Config(format!(
                        "Unable to reach network {} at {} :: {}",
                        self.network_name, network.url, err_code
                    ))
                })?
                .as_u64(),
        };

        log::info!(
            "Using network {} ({}), chain_id={}, sender={:#x}",
            self.network_name,
            network.url,
            chain_id,
            wallet.address()
        );

        let client = SignerMiddleware::new(provider, wallet.with_chain_id(chain_id));
        Ok(EthersChain::new(Arc::new(client), network.confirmations))
    }

    pub fn verifier(&self, chain_id: u64) -> Result<EtherscanVerifier, TaskError> {
        let api_key = self
            .settings
            .etherscan_api_key(&self.network_name)
            .ok_or_else(|| {
                TaskError::Config(format!(
                    "No explorer API key for network {}, set etherscan.api_keys.{} or {}",
                    self.network_name,
                    self.network_name,
                    toolkit_config::ETHERSCAN_API_KEY_ENV
                ))
            })?;

        EtherscanVerifier::new(chain_id, &api_key, self.artifacts())
    }
}
