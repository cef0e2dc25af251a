//! Calls a method on a deployed contract.
//!
//! Usage:
//!
//! ```text
//! chainkit call \
//!     --contract ArtToken \
//!     --address 0x0093b0c1a5df2711576A58942694E80BCC73CeDc \
//!     --method balanceOf \
//!     --params '["0x6047Ac71f35aD757eBEc74aDA7Ee0Ae147740247"]'
//! ```

use chainkit_common::params::{
    coerce_params, parse_params, token_to_json, ParamValue,
};
use ethers::{
    abi::{Abi, Function, StateMutability, Token},
    types::{Address, H256},
};
use serde_json::Value;

use crate::{chain::Chain, checksum, errors::TaskError, task_context::TaskContext};

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Decoded outputs of a read-only call.
    Returned(Vec<Token>),
    /// Hash of a mined state-changing transaction.
    Sent(H256),
}

impl CallOutcome {
    /// A single output renders as itself, several as a JSON array.
    pub fn to_json(&self) -> Value {
        match self {
            CallOutcome::Returned(tokens) if tokens.len() == 1 => {
                token_to_json(&tokens[0])
            }
            CallOutcome::Returned(tokens) => {
                Value::Array(tokens.iter().map(token_to_json).collect())
            }
            CallOutcome::Sent(hash) => serde_json::json!({
                "hash": format!("{:#x}", hash),
                "status": 1,
            }),
        }
    }
}

/// A resolved function with its coerced arguments.
#[derive(Debug, Clone)]
pub struct MethodCall {
    function: Function,
    tokens: Vec<Token>,
}

impl MethodCall {
    pub fn prepare(
        abi: &Abi,
        method: &str,
        values: &[ParamValue],
    ) -> Result<Self, TaskError> {
        let function = select_function(abi, method, values.len())?;
        let tokens = coerce_params(&function.inputs, values)?;
        Ok(Self { function: function.clone(), tokens })
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self.function.state_mutability,
            StateMutability::View | StateMutability::Pure
        )
    }

    pub async fn invoke<C: Chain>(
        &self,
        chain: &C,
        address: Address,
    ) -> Result<CallOutcome, TaskError> {
        let calldata =
            self.function.encode_input(&self.tokens).map_err(|err_code| {
                TaskError::Argument(format!(
                    "Unable to encode {} call :: {}",
                    self.function.name, err_code
                ))
            })?;

        if !self.is_read_only() {
            let tx_hash = chain.send(address, calldata.into()).await?;
            return Ok(CallOutcome::Sent(tx_hash));
        }

        let raw = chain.call(address, calldata.into()).await?;
        let outputs = self.function.decode_output(&raw).map_err(|err_code| {
            TaskError::Transaction(format!(
                "Unable to decode {} result :: {}",
                self.function.name, err_code
            ))
        })?;
        Ok(CallOutcome::Returned(outputs))
    }
}

/// Picks `method` from `abi`. Overloads are told apart by argument count,
/// or by a full signature such as `mint(address,uint256)`.
pub fn select_function<'a>(
    abi: &'a Abi,
    method: &str,
    arity: usize,
) -> Result<&'a Function, TaskError> {
    if let Some((name, _)) = method.split_once('(') {
        return abi
            .functions_by_name(name)
            .ok()
            .and_then(|candidates| {
                candidates.iter().find(|function| signature(function) == method)
            })
            .ok_or_else(|| {
                TaskError::Argument(format!("No function matches {}", method))
            });
    }

    let candidates = abi.functions_by_name(method).map_err(|_| {
        TaskError::Argument(format!("Contract has no method '{}'", method))
    })?;

    match candidates.as_slice() {
        [only] => Ok(only),
        overloads => {
            let mut matching =
                overloads.iter().filter(|function| function.inputs.len() == arity);
            match (matching.next(), matching.next()) {
                (Some(function), None) => Ok(function),
                (None, _) => Err(TaskError::Argument(format!(
                    "No overload of '{}' takes {} params",
                    method, arity
                ))),
                (Some(_), Some(_)) => Err(TaskError::Argument(format!(
                    "'{}' is ambiguous with {} params, use one of: {}",
                    method,
                    arity,
                    overloads
                        .iter()
                        .map(signature)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))),
            }
        }
    }
}

fn signature(function: &Function) -> String {
    let kinds: Vec<String> =
        function.inputs.iter().map(|param| param.kind.to_string()).collect();
    format!("{}({})", function.name, kinds.join(","))
}

/// Calls a contract method and prints the result
#[derive(Clone, Debug, clap::Args)]
#[clap(name = "call")]
pub struct CallCmd {
    /// Name of the contract
    #[clap(long = "contract")]
    contract: String,

    /// Address of the contract
    #[clap(long = "address")]
    address: Address,

    /// Name or full signature of the method to call
    #[clap(long = "method")]
    method: String,

    /// JSON arguments to the method
    #[clap(long = "params", default_value = "[]")]
    params: String,
}

impl CallCmd {
    pub async fn exec(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        let values = parse_params(&self.params).map_err(TaskError::from)?;
        let artifact = ctx.artifacts().resolve(&self.contract).map_err(TaskError::from)?;
        let call = MethodCall::prepare(&artifact.abi, &self.method, &values)?;

        let params: Vec<String> =
            values.iter().map(|value| value.to_string()).collect();
        println!(
            "Calling method {} on {} at {} with params:\n{}",
            self.method,
            self.contract,
            checksum(&self.address),
            params.join("\n")
        );

        let outcome = if call.is_read_only() {
            call.invoke(&ctx.connect_read_only()?, self.address).await?
        } else {
            call.invoke(&ctx.connect().await?, self.address).await?
        };

        println!("Result: {}", outcome.to_json());
        Ok(())
    }
}
