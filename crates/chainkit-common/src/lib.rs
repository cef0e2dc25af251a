use ethers::types::H256;
use sha3::{Digest, Keccak256};

pub mod account;
pub mod artifacts;
pub mod params;
pub mod primitives;
pub mod toolkit_config;


/// Keccak-256 digest of arbitrary bytes.
pub fn keccak256(input: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(input.as_ref());
    hasher.finalize().into()
}

/// Keccak-256 of a UTF-8 string, the way role identifiers and event topics
/// are derived from their names.
pub fn id(text: &str) -> H256 {
    H256::from(keccak256(text.as_bytes()))
}

/// Strips surrounding whitespace, quotes and the `0x` prefix from a hex string.
pub fn clean_hex_string(input: &str) -> &str {
    let trimmed = input.trim().trim_matches('"');
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_of_test_string() {
        // Act
        let hash = id("test");

        // Assert
        assert_eq!(
            format!("{hash:#x}"),
            "0x9c22ff5f21f0b81b113e63f7db6da94fedef11b2119b4088b89664fb9a3cb658"
        );
    }

    #[test]
    fn test_keccak256_is_deterministic() {
        assert_eq!(keccak256(b"AUTHORIZER"), keccak256("AUTHORIZER"));
        assert_ne!(keccak256(b"AUTHORIZER"), keccak256(b"MINTER"));
    }

    #[test]
    fn test_clean_hex_string() {
        assert_eq!(clean_hex_string(" \"0xdeadbeef\" "), "deadbeef");
        assert_eq!(clean_hex_string("0XAB"), "AB");
        assert_eq!(clean_hex_string("cafe"), "cafe");
    }
}
