use anyhow::Result;

/// `keccak256(<input>) = 0x<hash>` for the UTF-8 bytes of `input`.
pub fn sha3_line(input: &str) -> String {
    format!(
        "keccak256({}) = 0x{}",
        input,
        hex::encode(chainkit_common::keccak256(input.as_bytes()))
    )
}

/// Keccak-256 hash of a UTF-8 string
#[derive(Debug, clap::Args)]
#[clap(name = "sha3")]
pub struct Sha3Cmd {
    /// String to hash
    input: String,
}

impl Sha3Cmd {
    pub fn exec(&self) -> Result<()> {
        println!("{}", sha3_line(&self.input));
        Ok(())
    }
}
