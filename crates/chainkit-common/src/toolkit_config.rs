use std::{collections::HashMap, env, path::Path, path::PathBuf};

use config::{Config, Environment, File};
use ethers::signers::LocalWallet;
use serde::Deserialize;

use crate::account::{self, WalletError};

pub const DEFAULT_CONFIG_FILE: &str = "chainkit.yaml";
pub const ENV_PREFIX: &str = "CHAINKIT";
pub const DEFAULT_NETWORK: &str = "localhost";
pub const DEFAULT_LOCALHOST_URL: &str = "http://127.0.0.1:7545";
pub const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Network '{0}' is not configured")]
    UnknownNetwork(String),
    #[error("Network '{0}' has no accounts configured")]
    NoAccounts(String),
    #[error("Network '{0}' accounts need either a mnemonic or a private_key")]
    IncompleteAccounts(String),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub default_network: String,
    pub artifacts: PathBuf,
    pub networks: HashMap<String, Network>,
    #[serde(default)]
    pub etherscan: EtherscanSettings,
    #[serde(default)]
    pub proxy: ProxyArtifactNames,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Network {
    pub url: String,
    pub chain_id: Option<u64>,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    pub accounts: Option<Accounts>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Accounts {
    pub mnemonic: Option<String>,
    pub private_key: Option<String>,
    #[serde(default)]
    pub index: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EtherscanSettings {
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

/// Artifact names of the proxy contracts used for upgradeable deployments.
#[derive(Clone, Debug, Deserialize)]
pub struct ProxyArtifactNames {
    #[serde(default = "default_transparent_proxy")]
    pub transparent: String,
    #[serde(default = "default_proxy_admin")]
    pub admin: String,
    #[serde(default = "default_uups_proxy")]
    pub uups: String,
}

impl Default for ProxyArtifactNames {
    fn default() -> Self {
        Self {
            transparent: default_transparent_proxy(),
            admin: default_proxy_admin(),
            uups: default_uups_proxy(),
        }
    }
}

fn default_confirmations() -> usize {
    1
}

fn default_transparent_proxy() -> String {
    "TransparentUpgradeableProxy".to_string()
}

fn default_proxy_admin() -> String {
    "ProxyAdmin".to_string()
}

fn default_uups_proxy() -> String {
    "ERC1967Proxy".to_string()
}

/// Loads settings from `config_path` (optional) layered over built-in
/// defaults, then `CHAINKIT_*` environment overrides
/// (e.g. `CHAINKIT_NETWORKS__SEPOLIA__URL`).
pub fn load_settings(config_path: &Path) -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .set_default("default_network", DEFAULT_NETWORK)?
        .set_default("artifacts", DEFAULT_ARTIFACTS_DIR)?
        .set_default(
            format!("networks.{}.url", DEFAULT_NETWORK),
            DEFAULT_LOCALHOST_URL,
        )?
        .add_source(File::from(config_path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings: Settings = settings.try_deserialize().map_err(|err_code| {
        log::error!(
            "Failed to deserialize configuration :: {:#?} :: err {:#?}",
            config_path,
            err_code
        );
        err_code
    })?;

    Ok(settings)
}

impl Settings {
    pub fn network(&self, name: &str) -> Result<&Network, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }

    /// Explorer key for `network`, falling back to `ETHERSCAN_API_KEY`.
    pub fn etherscan_api_key(&self, network: &str) -> Option<String> {
        self.etherscan
            .api_keys
            .get(network)
            .cloned()
            .or_else(|| env::var(ETHERSCAN_API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Network {
    /// The signing wallet configured for this network. A private key takes
    /// precedence over a mnemonic.
    pub fn wallet(&self, name: &str) -> Result<LocalWallet, ConfigError> {
        let accounts = self
            .accounts
            .as_ref()
            .ok_or_else(|| ConfigError::NoAccounts(name.to_string()))?;

        match (&accounts.private_key, &accounts.mnemonic) {
            (Some(private_key), _) => {
                Ok(account::wallet_from_private_key(private_key)?)
            }
            (None, Some(mnemonic)) => {
                Ok(account::wallet_from_mnemonic(mnemonic, accounts.index)?)
            }
            (None, None) => {
                Err(ConfigError::IncompleteAccounts(name.to_string()))
            }
        }
    }
}
