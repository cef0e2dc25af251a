use crate::access_control::*;
use crate::bindings::{GrantRoleCall, HasRoleCall, RevokeRoleCall};
use crate::test_support::*;

use ethers::{
    abi::AbiEncode,
    contract::EthCall,
    types::{Address, H256},
};

fn change(action: RoleAction) -> RoleChange {
    RoleChange {
        contract: Address::from_low_u64_be(0xc0),
        role: "AUTHORIZER".to_string(),
        actor: Address::from_low_u64_be(0xa1),
        action,
    }
}

#[test]
fn test_role_id_is_keccak_of_name() {
    assert_eq!(
        change(RoleAction::Grant).role_id(),
        chainkit_common::id("AUTHORIZER")
    );
}

#[tokio::test]
async fn test_grant_sends_grant_role() {
    // Arrange
    let chain = MockChain::new();
    chain.set_call_result(HasRoleCall::selector(), true.encode().into());
    let grant = change(RoleAction::Grant);

    // Act
    let tx_hash = grant.apply(&chain).await.unwrap();

    // Assert
    assert_ne!(tx_hash, H256::zero());
    let sends = chain.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].to, grant.contract);
    assert_eq!(
        sends[0].calldata.to_vec(),
        GrantRoleCall { role: grant.role_id().0, account: grant.actor }.encode()
    );
}

#[tokio::test]
async fn test_revoke_sends_revoke_role() {
    // Arrange
    let chain = MockChain::new();
    let revoke = change(RoleAction::Revoke);

    // Act
    revoke.apply(&chain).await.unwrap();

    // Assert
    let sends = chain.sends();
    assert_eq!(
        sends[0].calldata.to_vec(),
        RevokeRoleCall { role: revoke.role_id().0, account: revoke.actor }.encode()
    );
}

#[test]
fn test_describe_grant() {
    let grant = change(RoleAction::Grant);

    let line = describe(&grant, H256::from_low_u64_be(1));

    assert!(line.starts_with("Grant role AUTHORIZER (0x"));
    assert!(line
        .to_lowercase()
        .contains(" to address 0x00000000000000000000000000000000000000a1"));
    assert!(line.ends_with(
        "txn=0x0000000000000000000000000000000000000000000000000000000000000001"
    ));
}

#[test]
fn test_describe_revoke() {
    let line = describe(&change(RoleAction::Revoke), H256::zero());

    assert!(line.starts_with("Revoke role AUTHORIZER"));
    assert!(line.contains(" from address "));
}
