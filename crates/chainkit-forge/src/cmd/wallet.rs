use anyhow::{Context, Result};
use chainkit_common::account::{derive_accounts, generate_mnemonic, DerivedAccount};

pub const DEFAULT_ADDRESS_COUNT: u32 = 10;

/// Renders derived accounts, one line each.
pub fn address_lines(
    accounts: &[DerivedAccount],
    private_keys: bool,
    json: bool,
) -> Result<Vec<String>> {
    accounts
        .iter()
        .map(|account| {
            if json {
                serde_json::to_string(&account.entry(private_keys))
                    .context("Unable to serialize account")
            } else if private_keys {
                Ok(format!(
                    "Address[{}] = {} key {}",
                    account.index,
                    account.checksum_address(),
                    account.private_key
                ))
            } else {
                Ok(format!(
                    "Address[{}] = {}",
                    account.index,
                    account.checksum_address()
                ))
            }
        })
        .collect()
}

/// Generates a random 12-word mnemonic
#[derive(Debug, clap::Args)]
#[clap(name = "gen-mnemonic")]
pub struct GenMnemonicCmd {}

impl GenMnemonicCmd {
    pub fn exec(&self) -> Result<()> {
        println!("Random mnemonic: {}", generate_mnemonic()?);
        Ok(())
    }
}

/// Lists the addresses derived from a mnemonic
#[derive(Debug, clap::Args)]
#[clap(name = "list-addresses")]
pub struct ListAddressesCmd {
    /// Mnemonic to derive from, a random one when omitted
    #[clap(long = "mnemonic")]
    mnemonic: Option<String>,

    /// Number of addresses to derive
    #[clap(long = "count", default_value_t = DEFAULT_ADDRESS_COUNT)]
    count: u32,

    /// Print private keys as well
    #[clap(long = "private-keys", default_value_t = false)]
    private_keys: bool,

    /// Print one JSON object per line
    #[clap(long = "json", default_value_t = false)]
    json: bool,
}

impl ListAddressesCmd {
    pub fn exec(&self) -> Result<()> {
        let mnemonic = match &self.mnemonic {
            Some(mnemonic) => mnemonic.clone(),
            None => {
                let mnemonic = generate_mnemonic()?;
                println!("Mnemonic: {}", mnemonic);
                mnemonic
            }
        };

        let accounts = derive_accounts(&mnemonic, self.count)?;
        log::debug!("Derived {} accounts", accounts.len());

        for line in address_lines(&accounts, self.private_keys, self.json)? {
            println!("{}", line);
        }
        Ok(())
    }
}
