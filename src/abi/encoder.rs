//! ABI encoder for Solidity/EVM contracts
//!
//! Every check (schema validity, shape, widths, counts) happens while the
//! output is being built into a local buffer, and any failure discards the
//! buffer, so callers never see partial output.

use super::selector::AbiSelector;
use super::types::*;
use crate::word::{fits_signed, Word};

/// ABI encoder
pub struct AbiEncoder;

impl AbiEncoder {
    /// Encode a single value according to its type
    pub fn encode_value(value: &AbiValue, abi_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        abi_type.validate()?;
        Self::encode_checked(value, abi_type)
    }

    /// Encode against a schema that has already been validated
    fn encode_checked(value: &AbiValue, abi_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        let actual = value.abi_type();
        if actual != *abi_type {
            return Err(AbiError::TypeMismatch {
                expected: abi_type.clone(),
                got: actual,
            });
        }

        match (value, abi_type) {
            (AbiValue::Uint { value: v, .. }, AbiType::Uint(bits)) => {
                if v.bits() > *bits as u64 {
                    return Err(AbiError::Overflow {
                        abi_type: abi_type.clone(),
                        detail: v.to_string(),
                    });
                }
                let word = Word::from_unsigned(v).map_err(|e| AbiError::Overflow {
                    abi_type: abi_type.clone(),
                    detail: e.to_string(),
                })?;
                Ok(word.as_bytes().to_vec())
            }

            (AbiValue::Int { value: v, .. }, AbiType::Int(bits)) => {
                if !fits_signed(v, *bits) {
                    return Err(AbiError::Overflow {
                        abi_type: abi_type.clone(),
                        detail: v.to_string(),
                    });
                }
                let word = Word::from_signed(v).map_err(|e| AbiError::Overflow {
                    abi_type: abi_type.clone(),
                    detail: e.to_string(),
                })?;
                Ok(word.as_bytes().to_vec())
            }

            (AbiValue::Address(addr), AbiType::Address) => {
                let mut result = [0u8; 32];
                result[12..].copy_from_slice(addr);
                Ok(result.to_vec())
            }

            (AbiValue::Bool(b), AbiType::Bool) => Ok(Word::from_u64(*b as u64).as_bytes().to_vec()),

            // Left-aligned, zero padded on the right
            (AbiValue::FixedBytes(bytes), AbiType::FixedBytes(_)) => {
                let mut result = [0u8; 32];
                result[..bytes.len()].copy_from_slice(bytes);
                Ok(result.to_vec())
            }

            (AbiValue::Bytes(bytes), AbiType::Bytes) => Ok(Self::encode_dynamic_bytes(bytes)),

            (AbiValue::String(s), AbiType::String) => Ok(Self::encode_dynamic_bytes(s.as_bytes())),

            (AbiValue::Array { items, .. }, AbiType::Array(inner)) => {
                Self::encode_dynamic_array(items, inner)
            }

            // No length prefix; size already checked through abi_type()
            (AbiValue::FixedArray { items, .. }, AbiType::FixedArray(inner, _)) => {
                let types = vec![inner.as_ref().clone(); items.len()];
                Self::encode_tuple(items, &types)
            }

            (AbiValue::Tuple(values), AbiType::Tuple(types)) => Self::encode_tuple(values, types),

            _ => Err(AbiError::TypeMismatch {
                expected: abi_type.clone(),
                got: actual,
            }),
        }
    }

    /// Encode an argument list as a tuple
    pub fn encode(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        for t in types {
            t.validate()?;
        }
        if values.len() != types.len() {
            return Err(AbiError::LengthMismatch {
                expected: types.len(),
                got: values.len(),
            });
        }

        Self::encode_tuple(values, types)
    }

    /// Head/tail layout: static members inline, dynamic members as offsets
    /// from the start of this tuple's head into the tail
    fn encode_tuple(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        let head_size = types
            .iter()
            .fold(0usize, |total, t| total.saturating_add(t.head_size()));

        let mut head = Vec::new();
        let mut tail = Vec::new();

        for (value, abi_type) in values.iter().zip(types.iter()) {
            let encoded = Self::encode_checked(value, abi_type)?;
            if abi_type.is_dynamic() {
                let offset = head_size + tail.len();
                head.extend_from_slice(Word::from_u64(offset as u64).as_bytes());
                tail.extend_from_slice(&encoded);
            } else {
                head.extend_from_slice(&encoded);
            }
        }

        head.extend_from_slice(&tail);
        Ok(head)
    }

    /// Length word followed by the data right-padded to a 32-byte boundary
    fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
        let padded_len = bytes.len().div_ceil(32) * 32;

        let mut result = Vec::with_capacity(32 + padded_len);
        result.extend_from_slice(Word::from_u64(bytes.len() as u64).as_bytes());
        result.extend_from_slice(bytes);
        result.resize(32 + padded_len, 0);
        result
    }

    /// Count word followed by the elements encoded as a tuple
    fn encode_dynamic_array(values: &[AbiValue], inner_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        let mut result = Vec::new();
        result.extend_from_slice(Word::from_u64(values.len() as u64).as_bytes());

        let types = vec![inner_type.clone(); values.len()];
        result.extend_from_slice(&Self::encode_tuple(values, &types)?);
        Ok(result)
    }

    /// Calldata: selector followed by the encoded inputs
    pub fn encode_function_call(function: &AbiFunction, values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        Self::with_selector(function.selector(), values, &function.input_types())
    }

    /// Calldata from a signature string, e.g. `transfer(address,uint256)`
    pub fn encode_function_call_by_signature(signature: &str, values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let (name, types) = parse_signature(signature)?;
        let canonical = AbiFunction::from_types(name, types.clone(), vec![]);
        Self::with_selector(canonical.selector(), values, &types)
    }

    /// Revert payload for a custom error
    pub fn encode_error(error: &AbiCustomError, values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        Self::with_selector(error.selector(), values, &error.input_types())
    }

    /// Event topic for a signature string
    pub fn event_topic(signature: &str) -> Result<[u8; 32], AbiError> {
        let (name, types) = parse_signature(signature)?;
        let canonical = AbiFunction::from_types(name, types, vec![]);
        Ok(AbiSelector::topic_from_signature(&canonical.signature()))
    }

    fn with_selector(selector: [u8; 4], values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        let params = Self::encode(values, types)?;

        let mut result = Vec::with_capacity(4 + params.len());
        result.extend_from_slice(&selector);
        result.extend_from_slice(&params);
        Ok(result)
    }
}
