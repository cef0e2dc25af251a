use crate::contract_call::*;
use crate::errors::TaskError;
use crate::test_support::*;

use chainkit_common::{artifacts::ArtifactStore, params::parse_params};
use ethers::{
    abi::{AbiEncode, Token},
    types::{Address, U256},
};
use serde_json::json;

fn token_abi() -> ethers::abi::Abi {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_artifacts(dir.path());
    ArtifactStore::new(dir.path()).resolve("Token").unwrap().abi
}

#[test]
fn test_select_overload_by_arity() {
    let abi = token_abi();

    let two = select_function(&abi, "mint", 2).unwrap();
    let one = select_function(&abi, "mint", 1).unwrap();

    assert_eq!(two.inputs.len(), 2);
    assert_eq!(one.inputs.len(), 1);
    assert!(matches!(
        select_function(&abi, "mint", 3),
        Err(TaskError::Argument(_))
    ));
}

#[test]
fn test_select_by_signature() {
    let abi = token_abi();

    let function = select_function(&abi, "mint(uint256)", 0).unwrap();

    assert_eq!(function.inputs.len(), 1);
    assert!(select_function(&abi, "mint(bool)", 1).is_err());
}

#[test]
fn test_unknown_method_is_an_argument_error() {
    let abi = token_abi();

    let result = MethodCall::prepare(&abi, "burn", &[]);

    assert!(matches!(result, Err(TaskError::Argument(_))));
}

#[tokio::test]
async fn test_view_call_decodes_outputs() {
    // Arrange
    let abi = token_abi();
    let chain = MockChain::new();
    let holder = "0x6047Ac71f35aD757eBEc74aDA7Ee0Ae147740247";
    let call = MethodCall::prepare(
        &abi,
        "balanceOf",
        &parse_params(&format!(r#"["{holder}"]"#)).unwrap(),
    )
    .unwrap();
    chain.set_call_result(
        call.function().short_signature(),
        U256::from(1234).encode().into(),
    );
    let token = Address::from_low_u64_be(0x77);

    // Act
    let outcome = call.invoke(&chain, token).await.unwrap();

    // Assert
    assert!(call.is_read_only());
    assert_eq!(outcome, CallOutcome::Returned(vec![Token::Uint(U256::from(1234))]));
    assert_eq!(outcome.to_json(), json!(1234));
    assert!(chain.sends().is_empty());
    assert_eq!(chain.calls()[0].to, token);
}

#[tokio::test]
async fn test_state_changing_call_sends_transaction() {
    // Arrange
    let abi = token_abi();
    let chain = MockChain::new();
    let call =
        MethodCall::prepare(&abi, "mint", &parse_params("[500]").unwrap()).unwrap();
    let token = Address::from_low_u64_be(0x77);

    // Act
    let outcome = call.invoke(&chain, token).await.unwrap();

    // Assert
    assert!(!call.is_read_only());
    assert!(matches!(outcome, CallOutcome::Sent(_)));
    let sends = chain.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].to, token);
    assert_eq!(
        sends[0].calldata.to_vec(),
        call.function().encode_input(call.tokens()).unwrap()
    );
}

#[tokio::test]
async fn test_reverted_call_surfaces_transaction_error() {
    // Arrange
    let abi = token_abi();
    let chain = MockChain::new();
    chain.revert_sends();
    let call =
        MethodCall::prepare(&abi, "mint", &parse_params("[500]").unwrap()).unwrap();

    // Act
    let result = call.invoke(&chain, Address::from_low_u64_be(0x77)).await;

    // Assert
    assert!(matches!(result, Err(TaskError::Transaction(_))));
}

#[test]
fn test_multiple_outputs_render_as_array() {
    let outcome = CallOutcome::Returned(vec![
        Token::Bool(true),
        Token::Uint(U256::from(7)),
    ]);

    assert_eq!(outcome.to_json(), json!([true, 7]));
}
