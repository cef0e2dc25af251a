use ethers::types::{Address, H256};
use hex_literal::hex;

/// EIP-1967 implementation slot, `keccak256("eip1967.proxy.implementation") - 1`.
pub const IMPLEMENTATION_SLOT: [u8; 32] =
    hex!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// EIP-1967 admin slot, `keccak256("eip1967.proxy.admin") - 1`.
pub const ADMIN_SLOT: [u8; 32] =
    hex!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// BIP-44 path prefix for Ethereum accounts; the account index is appended.
pub const DEFAULT_DERIVATION_PREFIX: &str = "m/44'/60'/0'/0/";

pub fn implementation_slot() -> H256 {
    H256::from(IMPLEMENTATION_SLOT)
}

pub fn admin_slot() -> H256 {
    H256::from(ADMIN_SLOT)
}

/// An address stored in a slot occupies its low-order 20 bytes.
pub fn address_from_slot(word: H256) -> Address {
    Address::from_slice(
        &word.as_bytes()[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..],
    )
}

pub fn derivation_path(index: u32) -> String {
    format!("{}{}", DEFAULT_DERIVATION_PREFIX, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    fn eip1967_slot(label: &str) -> [u8; 32] {
        let slot = U256::from_big_endian(&crate::keccak256(label)) - U256::one();
        let mut bytes = [0u8; 32];
        slot.to_big_endian(&mut bytes);
        bytes
    }

    #[test]
    fn test_slots_follow_eip1967_derivation() {
        assert_eq!(IMPLEMENTATION_SLOT, eip1967_slot("eip1967.proxy.implementation"));
        assert_eq!(ADMIN_SLOT, eip1967_slot("eip1967.proxy.admin"));
    }

    #[test]
    fn test_address_from_slot_takes_low_bytes() {
        // Arrange
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0x11; 20]);

        // Act
        let address = address_from_slot(H256::from(word));

        // Assert
        assert_eq!(address, Address::from([0x11; 20]));
    }

    #[test]
    fn test_derivation_path() {
        assert_eq!(derivation_path(7), "m/44'/60'/0'/0/7");
    }
}
