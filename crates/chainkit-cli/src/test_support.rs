//! In-memory chain, verifier and artifact fixtures for task tests.

use std::{collections::HashMap, fs, path::Path, sync::Mutex};

use chainkit_common::{
    artifacts::Artifact,
    primitives::{admin_slot, implementation_slot},
};
use ethers::{
    abi::{AbiDecode, Token},
    types::{Address, Bytes, H256},
};
use serde_json::{json, Value};

use crate::{
    bindings::{UpgradeCall, UpgradeToCall},
    chain::Chain,
    errors::TaskError,
    verify::{VerificationOutcome, VerificationRequest, Verifier},
};

pub const TRANSPARENT_PROXY: &str = "TransparentUpgradeableProxy";
pub const UUPS_PROXY: &str = "ERC1967Proxy";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDeploy {
    pub contract: String,
    pub address: Address,
    pub args: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSend {
    pub to: Address,
    pub calldata: Bytes,
}

#[derive(Default)]
struct MockState {
    next_address: u64,
    deploys: Vec<RecordedDeploy>,
    sends: Vec<RecordedSend>,
    calls: Vec<RecordedSend>,
    storage: HashMap<(Address, H256), H256>,
    call_results: HashMap<[u8; 4], Bytes>,
    revert_sends: bool,
}

/// Hands out sequential addresses and emulates the EIP-1967 slot writes
/// of proxy constructors and upgrade calls.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deploys(&self) -> Vec<RecordedDeploy> {
        self.state.lock().unwrap().deploys.clone()
    }

    pub fn sends(&self) -> Vec<RecordedSend> {
        self.state.lock().unwrap().sends.clone()
    }

    pub fn calls(&self) -> Vec<RecordedSend> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_storage(&self, address: Address, slot: H256, value: H256) {
        self.state
            .lock()
            .unwrap()
            .storage
            .insert((address, slot), value);
    }

    pub fn set_call_result(&self, selector: [u8; 4], result: Bytes) {
        self.state
            .lock()
            .unwrap()
            .call_results
            .insert(selector, result);
    }

    pub fn revert_sends(&self) {
        self.state.lock().unwrap().revert_sends = true;
    }
}

impl Chain for MockChain {
    async fn chain_id(&self) -> Result<u64, TaskError> {
        Ok(31337)
    }

    async fn deploy(
        &self,
        artifact: &Artifact,
        args: Vec<Token>,
    ) -> Result<Address, TaskError> {
        artifact.ensure_deployable()?;
        let mut state = self.state.lock().unwrap();
        state.next_address += 1;
        let address = Address::from_low_u64_be(0x1000 + state.next_address);

        let slot_address = |index: usize| match args.get(index) {
            Some(Token::Address(value)) => Some(H256::from(*value)),
            _ => None,
        };
        if artifact.contract_name == TRANSPARENT_PROXY
            || artifact.contract_name == UUPS_PROXY
        {
            if let Some(implementation) = slot_address(0) {
                state
                    .storage
                    .insert((address, implementation_slot()), implementation);
            }
        }
        if artifact.contract_name == TRANSPARENT_PROXY {
            if let Some(admin) = slot_address(1) {
                state.storage.insert((address, admin_slot()), admin);
            }
        }

        state.deploys.push(RecordedDeploy {
            contract: artifact.contract_name.clone(),
            address,
            args,
        });
        Ok(address)
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<H256, TaskError> {
        let mut state = self.state.lock().unwrap();
        if state.revert_sends {
            return Err(TaskError::Transaction(format!(
                "Txn to {:#x} reverted",
                to
            )));
        }

        if let Ok(call) = UpgradeCall::decode(&calldata) {
            state.storage.insert(
                (call.proxy, implementation_slot()),
                H256::from(call.implementation),
            );
        } else if let Ok(call) = UpgradeToCall::decode(&calldata) {
            state.storage.insert(
                (to, implementation_slot()),
                H256::from(call.new_implementation),
            );
        }

        state.sends.push(RecordedSend { to, calldata });
        Ok(H256::from_low_u64_be(state.sends.len() as u64))
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, TaskError> {
        let mut state = self.state.lock().unwrap();
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);
        state.calls.push(RecordedSend { to, calldata });

        state.call_results.get(&selector).cloned().ok_or_else(|| {
            TaskError::Transaction(format!("Call to {:#x} reverted", to))
        })
    }

    async fn storage_at(
        &self,
        address: Address,
        slot: H256,
    ) -> Result<H256, TaskError> {
        let state = self.state.lock().unwrap();
        Ok(state.storage.get(&(address, slot)).copied().unwrap_or_default())
    }
}

/// Records what it is asked to verify.
#[derive(Default)]
pub struct MockVerifier {
    requests: Mutex<Vec<(String, VerificationRequest)>>,
    failure: Option<String>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self { requests: Mutex::default(), failure: Some(reason.to_string()) }
    }

    pub fn requests(&self) -> Vec<(String, VerificationRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Verifier for MockVerifier {
    async fn verify(
        &self,
        artifact: &Artifact,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, TaskError> {
        self.requests
            .lock()
            .unwrap()
            .push((artifact.contract_name.clone(), request.clone()));

        match &self.failure {
            Some(reason) => Err(TaskError::Verification(reason.clone())),
            None => Ok(VerificationOutcome::Verified),
        }
    }
}

fn input(name: &str, kind: &str) -> Value {
    json!({ "name": name, "type": kind, "internalType": kind })
}

fn write_artifact(root: &Path, source: &str, name: &str, abi: Value) {
    let dir = root.join(source);
    fs::create_dir_all(&dir).unwrap();
    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": name,
        "sourceName": source,
        "abi": abi,
        "bytecode": "0x608060405234801561001057600080fd5b50",
        "deployedBytecode": "0x",
        "linkReferences": {},
        "deployedLinkReferences": {}
    });
    fs::write(dir.join(format!("{name}.json")), artifact.to_string()).unwrap();
}

/// Writes a small Hardhat artifact tree:
///
/// * `Token(string name, uint256 supply)`, a plain contract
/// * `TokenV1` / `TokenV2`, upgradeable with `initialize(string,uint256)`
/// * `Registry`, upgradeable with no initializer
/// * the OpenZeppelin proxy contracts
pub fn write_fixture_artifacts(root: &Path) {
    write_artifact(
        root,
        "contracts/Token.sol",
        "Token",
        json!([
            {
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [input("name", "string"), input("supply", "uint256")]
            },
            {
                "type": "function",
                "name": "balanceOf",
                "stateMutability": "view",
                "inputs": [input("account", "address")],
                "outputs": [input("", "uint256")]
            },
            {
                "type": "function",
                "name": "mint",
                "stateMutability": "nonpayable",
                "inputs": [input("to", "address"), input("amount", "uint256")],
                "outputs": []
            },
            {
                "type": "function",
                "name": "mint",
                "stateMutability": "nonpayable",
                "inputs": [input("amount", "uint256")],
                "outputs": []
            }
        ]),
    );

    for name in ["TokenV1", "TokenV2"] {
        write_artifact(
            root,
            &format!("contracts/{name}.sol"),
            name,
            json!([{
                "type": "function",
                "name": "initialize",
                "stateMutability": "nonpayable",
                "inputs": [input("name", "string"), input("supply", "uint256")],
                "outputs": []
            }]),
        );
    }

    write_artifact(root, "contracts/Registry.sol", "Registry", json!([]));

    write_artifact(
        root,
        "@openzeppelin/contracts/proxy/transparent/ProxyAdmin.sol",
        "ProxyAdmin",
        json!([]),
    );
    write_artifact(
        root,
        "@openzeppelin/contracts/proxy/transparent/TransparentUpgradeableProxy.sol",
        TRANSPARENT_PROXY,
        json!([{
            "type": "constructor",
            "stateMutability": "payable",
            "inputs": [
                input("_logic", "address"),
                input("admin_", "address"),
                input("_data", "bytes")
            ]
        }]),
    );
    write_artifact(
        root,
        "@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol",
        UUPS_PROXY,
        json!([{
            "type": "constructor",
            "stateMutability": "payable",
            "inputs": [input("_logic", "address"), input("_data", "bytes")]
        }]),
    );
}
