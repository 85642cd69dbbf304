//! ABI decoder for Solidity/EVM contracts
//!
//! Every offset and length read from the buffer is bounds-checked with
//! overflow-safe arithmetic before it is used. Scalars must be canonically
//! padded; trailing bytes after the last tail are ignored.

use super::types::*;
use crate::hex_codec::HexCodec;
use crate::word::{fits_signed, Word, WORD_SIZE};

/// ABI decoder
pub struct AbiDecoder;

/// Bytes a decode may still produce
///
/// A canonical encoding never yields more than its own length: every scalar,
/// length word and byte payload is read from distinct input bytes. Tails
/// shared between several offsets would be copied once per reference, so the
/// total is capped at the input size.
struct Budget {
    remaining: usize,
}

impl Budget {
    fn for_input(data: &[u8]) -> Self {
        Self { remaining: data.len() }
    }

    fn charge(&mut self, len: usize) -> Result<(), AbiError> {
        self.remaining = self.remaining.checked_sub(len).ok_or_else(|| {
            AbiError::DecodingError("Decoded size exceeds input size (overlapping tails)".to_string())
        })?;
        Ok(())
    }
}

impl AbiDecoder {
    /// Decode a single value at `offset`, returning it with the offset just past its head
    pub fn decode_value(data: &[u8], abi_type: &AbiType, offset: usize) -> Result<(AbiValue, usize), AbiError> {
        abi_type.validate()?;
        Self::value_at(data, abi_type, offset, &mut Budget::for_input(data))
    }

    fn value_at(
        data: &[u8],
        abi_type: &AbiType,
        offset: usize,
        budget: &mut Budget,
    ) -> Result<(AbiValue, usize), AbiError> {
        match abi_type {
            AbiType::Uint(bits) => {
                let word = Self::read_word(data, offset)?;
                budget.charge(WORD_SIZE)?;
                let value = word.to_unsigned();
                if value.bits() > *bits as u64 {
                    return Err(AbiError::DecodingError(format!(
                        "{} at offset {} does not fit in uint{}",
                        word, offset, bits
                    )));
                }
                Ok((AbiValue::Uint { bits: *bits, value }, offset + WORD_SIZE))
            }

            AbiType::Int(bits) => {
                let word = Self::read_word(data, offset)?;
                budget.charge(WORD_SIZE)?;
                let value = word.to_signed();
                if !fits_signed(&value, *bits) {
                    return Err(AbiError::DecodingError(format!(
                        "{} at offset {} is not a sign-extended int{}",
                        word, offset, bits
                    )));
                }
                Ok((AbiValue::Int { bits: *bits, value }, offset + WORD_SIZE))
            }

            AbiType::Address => {
                let word = Self::read_word(data, offset)?;
                budget.charge(WORD_SIZE)?;
                let bytes = word.as_bytes();
                if bytes[..12].iter().any(|b| *b != 0) {
                    return Err(AbiError::DecodingError(format!(
                        "Dirty address padding at offset {}",
                        offset
                    )));
                }
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&bytes[12..]);
                Ok((AbiValue::Address(addr), offset + WORD_SIZE))
            }

            AbiType::Bool => {
                let word = Self::read_word(data, offset)?;
                budget.charge(WORD_SIZE)?;
                let value = match word.to_u64() {
                    Some(0) => false,
                    Some(1) => true,
                    _ => {
                        return Err(AbiError::DecodingError(format!(
                            "Invalid bool {} at offset {}",
                            word, offset
                        )))
                    }
                };
                Ok((AbiValue::Bool(value), offset + WORD_SIZE))
            }

            AbiType::FixedBytes(size) => {
                let word = Self::read_word(data, offset)?;
                budget.charge(WORD_SIZE)?;
                let bytes = word.as_bytes();
                if *size > WORD_SIZE || bytes[*size..].iter().any(|b| *b != 0) {
                    return Err(AbiError::DecodingError(format!(
                        "Dirty bytes{} padding at offset {}",
                        size, offset
                    )));
                }
                Ok((AbiValue::FixedBytes(bytes[..*size].to_vec()), offset + WORD_SIZE))
            }

            AbiType::Bytes => {
                let bytes = Self::decode_dynamic_bytes(data, offset, budget)?;
                Ok((AbiValue::Bytes(bytes), offset + WORD_SIZE))
            }

            AbiType::String => {
                let bytes = Self::decode_dynamic_bytes(data, offset, budget)?;
                let s = String::from_utf8(bytes)
                    .map_err(|_| AbiError::DecodingError("Invalid UTF-8 in string".to_string()))?;
                Ok((AbiValue::String(s), offset + WORD_SIZE))
            }

            AbiType::Array(inner_type) => {
                let count = Self::read_usize(data, offset, "array length")?;
                budget.charge(WORD_SIZE)?;
                let base = Self::checked_offset(offset, WORD_SIZE, data.len())?;
                Self::ensure_elements(data, base, count, inner_type)?;

                let types = vec![inner_type.as_ref().clone(); count];
                let (items, _) = Self::decode_tuple(data, base, &types, budget)?;
                Ok((
                    AbiValue::Array { element: inner_type.as_ref().clone(), items },
                    offset + WORD_SIZE,
                ))
            }

            AbiType::FixedArray(inner_type, size) => {
                Self::ensure_elements(data, offset, *size, inner_type)?;
                let types = vec![inner_type.as_ref().clone(); *size];
                let (items, end) = Self::decode_tuple(data, offset, &types, budget)?;
                let value = AbiValue::FixedArray { element: inner_type.as_ref().clone(), items };
                Ok((value, end))
            }

            AbiType::Tuple(types) => {
                let (values, end) = Self::decode_tuple(data, offset, types, budget)?;
                Ok((AbiValue::Tuple(values), end))
            }
        }
    }

    /// Decode an argument or return list
    pub fn decode(data: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, AbiError> {
        for t in types {
            t.validate()?;
        }
        let (values, _) = Self::decode_tuple(data, 0, types, &mut Budget::for_input(data))?;

        for (value, expected) in values.iter().zip(types) {
            let got = value.abi_type();
            if got != *expected {
                return Err(AbiError::TypeMismatch {
                    expected: expected.clone(),
                    got,
                });
            }
        }
        Ok(values)
    }

    /// Decode a buffer holding exactly one top-level value
    pub fn decode_single(data: &[u8], abi_type: &AbiType) -> Result<AbiValue, AbiError> {
        let mut values = Self::decode(data, std::slice::from_ref(abi_type))?;
        values
            .pop()
            .ok_or_else(|| AbiError::DecodingError("Empty result".to_string()))
    }

    /// Heads start at `base`; dynamic members hold offsets relative to `base`
    fn decode_tuple(
        data: &[u8],
        base: usize,
        types: &[AbiType],
        budget: &mut Budget,
    ) -> Result<(Vec<AbiValue>, usize), AbiError> {
        let mut values = Vec::with_capacity(types.len());
        let mut head_offset = base;

        for abi_type in types {
            if abi_type.is_dynamic() {
                let relative = Self::read_usize(data, head_offset, "offset")?;
                let data_offset = Self::checked_offset(base, relative, data.len())?;
                let (value, _) = Self::value_at(data, abi_type, data_offset, budget)?;
                values.push(value);
                head_offset += WORD_SIZE;
            } else {
                let (value, next) = Self::value_at(data, abi_type, head_offset, budget)?;
                values.push(value);
                head_offset = next;
            }
        }

        Ok((values, head_offset))
    }

    /// Length word followed by that many bytes
    fn decode_dynamic_bytes(data: &[u8], offset: usize, budget: &mut Budget) -> Result<Vec<u8>, AbiError> {
        let length = Self::read_usize(data, offset, "length")?;
        let start = Self::checked_offset(offset, WORD_SIZE, data.len())?;
        Self::ensure(data, start, length)?;
        budget.charge(WORD_SIZE.saturating_add(length))?;
        Ok(data[start..start + length].to_vec())
    }

    /// `count` elements must have room for their heads before anything is allocated
    fn ensure_elements(data: &[u8], base: usize, count: usize, element: &AbiType) -> Result<(), AbiError> {
        let needed = count.checked_mul(element.head_size()).ok_or(AbiError::OutOfBounds {
            offset: base,
            len: usize::MAX,
            available: data.len(),
        })?;
        Self::ensure(data, base, needed)
    }

    fn read_word(data: &[u8], offset: usize) -> Result<Word, AbiError> {
        Self::ensure(data, offset, WORD_SIZE)?;
        Word::from_slice(&data[offset..offset + WORD_SIZE])
            .map_err(|e| AbiError::DecodingError(e.to_string()))
    }

    fn read_usize(data: &[u8], offset: usize, what: &str) -> Result<usize, AbiError> {
        let word = Self::read_word(data, offset)?;
        word.to_usize().ok_or_else(|| {
            AbiError::DecodingError(format!("{} {} at offset {} is too large", what, word, offset))
        })
    }

    fn checked_offset(base: usize, delta: usize, available: usize) -> Result<usize, AbiError> {
        base.checked_add(delta).ok_or(AbiError::OutOfBounds {
            offset: base,
            len: delta,
            available,
        })
    }

    /// `data[offset..offset + len]` must exist
    fn ensure(data: &[u8], offset: usize, len: usize) -> Result<(), AbiError> {
        match offset.checked_add(len) {
            Some(end) if end <= data.len() => Ok(()),
            _ => Err(AbiError::OutOfBounds {
                offset,
                len,
                available: data.len(),
            }),
        }
    }

    fn check_selector(expected: [u8; 4], data: &[u8]) -> Result<(), AbiError> {
        Self::ensure(data, 0, 4)?;
        if data[..4] != expected {
            return Err(AbiError::InvalidSelector {
                expected: HexCodec::serialize(&expected),
                got: HexCodec::serialize(&data[..4]),
            });
        }
        Ok(())
    }

    /// Decode a function's return data against its outputs
    pub fn decode_function_result(function: &AbiFunction, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        Self::decode(data, &function.output_types())
    }

    /// Decode calldata (selector checked) against a function's inputs
    pub fn decode_function_input(function: &AbiFunction, calldata: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        Self::check_selector(function.selector(), calldata)?;
        Self::decode(&calldata[4..], &function.input_types())
    }

    /// Decode a revert payload (selector checked) against an error's inputs
    pub fn decode_error(error: &AbiCustomError, payload: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        Self::check_selector(error.selector(), payload)?;
        Self::decode(&payload[4..], &error.input_types())
    }

    /// Decode an event log into named values in declaration order
    ///
    /// Indexed parameters come from topics; dynamic indexed parameters are
    /// only available as their 32-byte hash and surface as `bytes32`.
    pub fn decode_event(event: &AbiEvent, topics: &[Word], data: &[u8]) -> Result<Vec<(String, AbiValue)>, AbiError> {
        let mut topic_iter = topics.iter();

        if !event.anonymous {
            let signature = topic_iter
                .next()
                .ok_or_else(|| AbiError::DecodingError("Missing event signature topic".to_string()))?;
            let expected = event.topic();
            if signature.as_bytes() != &expected {
                return Err(AbiError::InvalidSelector {
                    expected: HexCodec::serialize(&expected),
                    got: signature.to_hex(),
                });
            }
        }

        let data_types: Vec<AbiType> = event
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.param.param_type.clone())
            .collect();
        let mut data_values = Self::decode(data, &data_types)?.into_iter();

        let mut result = Vec::with_capacity(event.inputs.len());
        for param in &event.inputs {
            let value = if param.indexed {
                let topic = topic_iter
                    .next()
                    .ok_or_else(|| AbiError::DecodingError("Missing indexed parameter topic".to_string()))?;
                if param.param.param_type.is_dynamic() {
                    AbiValue::FixedBytes(topic.as_bytes().to_vec())
                } else {
                    Self::decode_single(topic.as_bytes(), &param.param.param_type)?
                }
            } else {
                data_values
                    .next()
                    .ok_or_else(|| AbiError::DecodingError("Missing event data value".to_string()))?
            };
            result.push((param.param.name.clone(), value));
        }

        Ok(result)
    }
}
