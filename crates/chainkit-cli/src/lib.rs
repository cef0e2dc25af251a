use ethers::{types::Address, utils::to_checksum};

pub mod access_control;
pub mod bindings;
pub mod chain;
pub mod contract_call;
pub mod contract_deploy;
pub mod errors;
pub mod ownership;
pub mod proxy;
pub mod task_context;
pub mod verify;

#[cfg(test)]
mod access_control_tests;
#[cfg(test)]
mod contract_call_tests;
#[cfg(test)]
mod proxy_tests;
#[cfg(test)]
mod test_support;

/// EIP-55 rendering used for every address the tasks print.
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}
