use crate::{clean_hex_string, primitives::derivation_path};
use ethers::signers::{
    coins_bip39::{English, Mnemonic},
    LocalWallet, MnemonicBuilder, Signer,
};
use ethers::types::Address;
use ethers::utils::to_checksum;
use k256::ecdsa::SigningKey;
use serde::Serialize;
use std::str::FromStr;

/// Number of words in a freshly generated phrase.
pub const MNEMONIC_WORD_COUNT: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Unable to generate mnemonic: {0}")]
    Generation(String),
    #[error("Unable to derive account {index}: {reason}")]
    Derivation { index: u32, reason: String },
    #[error("Invalid private key: {0}")]
    PrivateKey(String),
}

/// An account derived from a mnemonic at a given index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAccount {
    pub index: u32,
    pub address: Address,
    pub private_key: String,
}

/// Line-oriented JSON form of a [`DerivedAccount`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntry {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl DerivedAccount {
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address, None)
    }

    pub fn entry(&self, with_private_key: bool) -> AccountEntry {
        AccountEntry {
            address: self.checksum_address(),
            private_key: with_private_key.then(|| self.private_key.clone()),
        }
    }
}

pub fn generate_mnemonic() -> Result<String, WalletError> {
    let mut rng = rand::thread_rng();
    let mnemonic =
        Mnemonic::<English>::new_with_count(&mut rng, MNEMONIC_WORD_COUNT)
            .map_err(|err| WalletError::Generation(err.to_string()))?;
    Ok(mnemonic.to_phrase())
}

pub fn wallet_from_mnemonic(
    phrase: &str,
    index: u32,
) -> Result<LocalWallet, WalletError> {
    let to_err = |err: ethers::signers::WalletError| WalletError::Derivation {
        index,
        reason: err.to_string(),
    };

    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .derivation_path(&derivation_path(index))
        .map_err(to_err)?
        .build()
        .map_err(to_err)
}

pub fn wallet_from_private_key(
    private_key: &str,
) -> Result<LocalWallet, WalletError> {
    LocalWallet::from_str(clean_hex_string(private_key))
        .map_err(|err| WalletError::PrivateKey(err.to_string()))
}

pub fn derive_account(
    phrase: &str,
    index: u32,
) -> Result<DerivedAccount, WalletError> {
    let wallet = wallet_from_mnemonic(phrase, index)?;
    let signing_key: &SigningKey = wallet.signer();

    Ok(DerivedAccount {
        index,
        address: wallet.address(),
        private_key: format!("0x{}", hex::encode(signing_key.to_bytes())),
    })
}

/// Derives the first `count` accounts of `phrase` along the default path.
pub fn derive_accounts(
    phrase: &str,
    count: u32,
) -> Result<Vec<DerivedAccount>, WalletError> {
    (0..count).map(|index| derive_account(phrase, index)).collect()
}
