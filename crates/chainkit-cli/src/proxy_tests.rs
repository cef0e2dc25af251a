use crate::errors::TaskError;
use crate::proxy::*;
use crate::test_support::*;

use chainkit_common::{
    artifacts::ArtifactStore,
    params::parse_params,
    primitives::{admin_slot, implementation_slot},
};
use ethers::types::{Address, H256};

fn store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_artifacts(dir.path());
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}

#[tokio::test]
async fn test_implementation_address_reads_low_bytes_of_slot() {
    // Arrange
    let chain = MockChain::new();
    let proxy = Address::from_low_u64_be(0x10);
    let mut word = [0xffu8; 32];
    word[12..].copy_from_slice(Address::from_low_u64_be(0x20).as_bytes());
    chain.set_storage(proxy, implementation_slot(), H256(word));

    // Act
    let implementation = implementation_address(&chain, proxy).await.unwrap();

    // Assert
    assert_eq!(implementation, Address::from_low_u64_be(0x20));
}

#[tokio::test]
async fn test_admin_address_of_plain_contract_is_zero() {
    let chain = MockChain::new();

    let admin = admin_address(&chain, Address::from_low_u64_be(0x10)).await.unwrap();

    assert!(admin.is_zero());
}

#[test]
fn test_initializer_calldata() {
    let (_dir, store) = store();
    let token = store.resolve("TokenV1").unwrap();
    let registry = store.resolve("Registry").unwrap();

    let (data, tokens) = initializer_calldata(
        &token.abi,
        "initialize",
        &parse_params(r#"["Art", 1]"#).unwrap(),
    )
    .unwrap();
    let (empty, no_tokens) =
        initializer_calldata(&registry.abi, "initialize", &[]).unwrap();
    let rejected = initializer_calldata(
        &registry.abi,
        "initialize",
        &parse_params("[1]").unwrap(),
    );

    assert_eq!(&data[..4], &token.abi.function("initialize").unwrap().short_signature());
    assert_eq!(tokens.len(), 2);
    assert!(empty.is_empty());
    assert!(no_tokens.is_empty());
    assert!(matches!(rejected, Err(TaskError::Argument(_))));
}

#[tokio::test]
async fn test_upgrade_through_recorded_admin() {
    // Arrange
    let chain = MockChain::new();
    let proxy = Address::from_low_u64_be(0x10);
    let admin = Address::from_low_u64_be(0x11);
    let new_implementation = Address::from_low_u64_be(0x12);
    chain.set_storage(proxy, admin_slot(), H256::from(admin));

    // Act
    upgrade_proxy(&chain, ProxyKind::Transparent, proxy, new_implementation)
        .await
        .unwrap();

    // Assert
    assert_eq!(chain.sends()[0].to, admin);
    assert_eq!(
        implementation_address(&chain, proxy).await.unwrap(),
        new_implementation
    );
}

#[test]
fn test_proxy_kind_display() {
    assert_eq!(ProxyKind::Transparent.to_string(), "transparent");
    assert_eq!(ProxyKind::Uups.to_string(), "uups");
}

#[test]
fn test_describe_implementation_uses_checksummed_addresses() {
    let proxy: Address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap();
    let implementation: Address =
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();

    let line = describe_implementation(proxy, implementation);

    assert_eq!(
        line,
        "Proxy 0x70997970C51812dc3A010C7d01b50e0d17dc79C8 impl 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    );
}

#[test]
fn test_proxy_kind_help_names_supported_openzeppelin_version() {
    use clap::ValueEnum;

    for kind in ProxyKind::value_variants() {
        let value = kind.to_possible_value().unwrap();
        let help = value.get_help().unwrap().to_string();

        assert!(help.contains("OZ 4.x"), "{}: {}", kind, help);
    }
}
