//! Typed coercion of JSON parameters against an ABI signature.
//!
//! Parameters arrive as a JSON array on the command line. Each value is
//! checked against the declared [`ParamType`] before anything is sent, so
//! integer width, sign, address and byte-length errors surface up front.
//! Number literals are kept as their exact source text, never as `f64`.

use ethers::abi::{Param, ParamType, Token};
use ethers::types::{Address, I256, U256};
use ethers::utils::to_checksum;
use serde_json::{value::RawValue, Value};
use std::{fmt, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid JSON params: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Params must be a JSON array, got: {0}")]
    NotArray(String),
    #[error("Expected {expected} params, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("Param {index} ({name}: {kind}): {reason}")]
    Mismatch {
        index: usize,
        name: String,
        kind: String,
        reason: String,
    },
}

/// A JSON value whose numbers are kept as literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Array(Vec<ParamValue>),
    Object(String),
}

impl ParamValue {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let raw: Box<RawValue> = serde_json::from_str(raw)?;
        Self::from_raw(&raw)
    }

    fn from_raw(raw: &RawValue) -> Result<Self, serde_json::Error> {
        let text = raw.get().trim();
        match text.as_bytes().first() {
            Some(b'[') => {
                let items: Vec<Box<RawValue>> = serde_json::from_str(text)?;
                items
                    .iter()
                    .map(|item| Self::from_raw(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(ParamValue::Array)
            }
            Some(b'"') => serde_json::from_str(text).map(ParamValue::String),
            Some(b't') | Some(b'f') => {
                serde_json::from_str(text).map(ParamValue::Bool)
            }
            Some(b'n') => {
                serde_json::from_str::<()>(text)?;
                Ok(ParamValue::Null)
            }
            Some(b'{') => Ok(ParamValue::Object(text.to_string())),
            _ => {
                serde_json::from_str::<serde::de::IgnoredAny>(text)?;
                Ok(ParamValue::Number(text.to_string()))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<ParamValue>> {
        match self {
            ParamValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(flag) => write!(f, "{}", flag),
            ParamValue::Number(text) | ParamValue::Object(text) => {
                f.write_str(text)
            }
            ParamValue::String(text) => write!(f, "{}", Value::from(text.as_str())),
            ParamValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Parses the raw `--params` argument into its positional values.
pub fn parse_params(raw: &str) -> Result<Vec<ParamValue>, ParamError> {
    match ParamValue::parse(raw)? {
        ParamValue::Array(values) => Ok(values),
        other => Err(ParamError::NotArray(other.to_string())),
    }
}

/// Coerces positional values into tokens for the given ABI inputs.
pub fn coerce_params(
    inputs: &[Param],
    values: &[ParamValue],
) -> Result<Vec<Token>, ParamError> {
    if inputs.len() != values.len() {
        return Err(ParamError::Arity {
            expected: inputs.len(),
            actual: values.len(),
        });
    }

    inputs
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| {
            coerce_value(&param.kind, value).map_err(|reason| {
                ParamError::Mismatch {
                    index,
                    name: param.name.clone(),
                    kind: param.kind.to_string(),
                    reason,
                }
            })
        })
        .collect()
}

pub fn coerce_value(
    kind: &ParamType,
    value: &ParamValue,
) -> Result<Token, String> {
    match kind {
        ParamType::Address => {
            let text = expect_str(value)?;
            Address::from_str(crate::clean_hex_string(text))
                .map(Token::Address)
                .map_err(|err| format!("invalid address '{}': {}", text, err))
        }
        ParamType::Bytes => decode_hex(value).map(Token::Bytes),
        ParamType::FixedBytes(len) => {
            let bytes = decode_hex(value)?;
            if bytes.len() != *len {
                return Err(format!(
                    "expected {} bytes, got {}",
                    len,
                    bytes.len()
                ));
            }
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Uint(bits) => parse_uint(value, *bits).map(Token::Uint),
        ParamType::Int(bits) => parse_int(value, *bits).map(Token::Int),
        ParamType::Bool => match value {
            ParamValue::Bool(flag) => Ok(Token::Bool(*flag)),
            ParamValue::String(text) if text == "true" => Ok(Token::Bool(true)),
            ParamValue::String(text) if text == "false" => {
                Ok(Token::Bool(false))
            }
            other => Err(format!("expected a boolean, got {}", other)),
        },
        ParamType::String => {
            expect_str(value).map(|text| Token::String(text.to_string()))
        }
        ParamType::Array(inner) => {
            let items = expect_array(value)?;
            coerce_items(inner, items).map(Token::Array)
        }
        ParamType::FixedArray(inner, len) => {
            let items = expect_array(value)?;
            if items.len() != *len {
                return Err(format!(
                    "expected {} elements, got {}",
                    len,
                    items.len()
                ));
            }
            coerce_items(inner, items).map(Token::FixedArray)
        }
        ParamType::Tuple(kinds) => {
            let items = expect_array(value)?;
            if items.len() != kinds.len() {
                return Err(format!(
                    "expected a tuple of {} elements, got {}",
                    kinds.len(),
                    items.len()
                ));
            }
            kinds
                .iter()
                .zip(items)
                .map(|(kind, item)| coerce_value(kind, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Token::Tuple)
        }
    }
}

/// Renders a token as JSON. Integers that fit 64 bits stay numeric, wider
/// ones become decimal strings; addresses are checksummed and bytes are hex.
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(address) => Value::String(to_checksum(address, None)),
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Uint(value) => {
            if value.bits() <= 64 {
                Value::from(value.as_u64())
            } else {
                Value::String(value.to_string())
            }
        }
        Token::Int(raw) => {
            let value = I256::from_raw(*raw);
            if value >= I256::from(i64::MIN) && value <= I256::from(i64::MAX) {
                Value::from(value.low_i64())
            } else {
                Value::String(value.to_string())
            }
        }
        Token::Bool(flag) => Value::Bool(*flag),
        Token::String(text) => Value::String(text.clone()),
        Token::FixedArray(items) | Token::Array(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_json).collect())
        }
    }
}

fn coerce_items(
    inner: &ParamType,
    items: &[ParamValue],
) -> Result<Vec<Token>, String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            coerce_value(inner, item)
                .map_err(|reason| format!("[{}] {}", i, reason))
        })
        .collect()
}

fn expect_str(value: &ParamValue) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, got {}", value))
}

fn expect_array(value: &ParamValue) -> Result<&Vec<ParamValue>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("expected an array, got {}", value))
}

fn decode_hex(value: &ParamValue) -> Result<Vec<u8>, String> {
    let text = expect_str(value)?;
    hex::decode(crate::clean_hex_string(text))
        .map_err(|err| format!("invalid hex '{}': {}", text, err))
}

/// Integer literal text: numbers keep their exact source digits and
/// strings may carry decimal or `0x` hex, with a leading `-` for signed types.
fn integer_text(value: &ParamValue) -> Result<String, String> {
    match value {
        ParamValue::Number(text) => Ok(text.clone()),
        ParamValue::String(text) => Ok(text.trim().to_string()),
        other => Err(format!("expected an integer, got {}", other)),
    }
}

/// Unsigned magnitude of decimal or `0x` hex digits. A bare `0x` is not a number.
fn parse_magnitude(text: &str) -> Option<U256> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some("") => None,
        Some(hex_digits) => U256::from_str_radix(hex_digits, 16).ok(),
        None if text.is_empty() => None,
        None => U256::from_dec_str(text).ok(),
    }
}

fn parse_uint(value: &ParamValue, bits: usize) -> Result<U256, String> {
    let text = integer_text(value)?;
    let parsed = parse_magnitude(&text)
        .ok_or_else(|| format!("'{}' is not an unsigned integer", text))?;

    if parsed.bits() > bits {
        return Err(format!("{} does not fit in uint{}", text, bits));
    }
    Ok(parsed)
}

fn parse_int(value: &ParamValue, bits: usize) -> Result<U256, String> {
    let text = integer_text(value)?;
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let magnitude = parse_magnitude(digits)
        .ok_or_else(|| format!("'{}' is not a signed integer", text))?;

    let bound = U256::one() << (bits - 1);
    let in_range = if negative {
        magnitude <= bound
    } else {
        magnitude < bound
    };
    if !in_range {
        return Err(format!("{} does not fit in int{}", text, bits));
    }

    // two's complement
    if negative {
        Ok((!magnitude).overflowing_add(U256::one()).0)
    } else {
        Ok(magnitude)
    }
}
