//! 256-bit EVM word
//!
//! A `Word` is always exactly 32 big-endian bytes. Whether it holds an
//! unsigned integer or a two's-complement signed integer depends on the
//! reader; conversions in both directions go through arbitrary-precision
//! integers and never truncate silently.

use crate::hex_codec::{HexCodec, HexError};
use ethers_core::types::U256;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of a word in bytes
pub const WORD_SIZE: usize = 32;

/// Word construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("Invalid word length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Hex value too long for a word: {0} bytes")]
    TooLong(usize),

    #[error("Unsigned value does not fit in 256 bits")]
    UnsignedOverflow,

    #[error("Signed value outside the int256 range")]
    SignedOverflow,

    #[error(transparent)]
    Hex(#[from] HexError),
}

/// Fixed 32-byte value
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word([u8; WORD_SIZE]);

impl Word {
    pub const ZERO: Word = Word([0u8; WORD_SIZE]);

    pub const fn new(bytes: [u8; WORD_SIZE]) -> Self {
        Word(bytes)
    }

    /// Build from exactly 32 raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, WordError> {
        let array: [u8; WORD_SIZE] = bytes
            .try_into()
            .map_err(|_| WordError::InvalidLength(bytes.len()))?;
        Ok(Word(array))
    }

    /// Parse hex (with or without `0x`), left-padding short input with zeros
    pub fn from_hex(s: &str) -> Result<Self, WordError> {
        let bytes = HexCodec::parse(s)?;
        if bytes.len() > WORD_SIZE {
            return Err(WordError::TooLong(bytes.len()));
        }
        Ok(Self::left_padded(&bytes, 0x00))
    }

    pub fn from_u64(value: u64) -> Self {
        Self::left_padded(&value.to_be_bytes(), 0x00)
    }

    /// Big-endian serialization with left zero padding
    pub fn from_unsigned(value: &BigUint) -> Result<Self, WordError> {
        let bytes = value.to_bytes_be();
        if bytes.len() > WORD_SIZE {
            return Err(WordError::UnsignedOverflow);
        }
        Ok(Self::left_padded(&bytes, 0x00))
    }

    /// Two's-complement encoding
    ///
    /// Non-negative values are zero padded and must leave the sign bit clear.
    /// Negative values are written as `~(-(value + 1))` padded with `0xFF`,
    /// which must leave the sign bit set.
    pub fn from_signed(value: &BigInt) -> Result<Self, WordError> {
        if value.sign() != Sign::Minus {
            let bytes = value.magnitude().to_bytes_be();
            if bytes.len() > WORD_SIZE {
                return Err(WordError::SignedOverflow);
            }
            let word = Self::left_padded(&bytes, 0x00);
            if word.is_negative() {
                return Err(WordError::SignedOverflow);
            }
            return Ok(word);
        }

        // -(value + 1) is non-negative here
        let complement = -(value + BigInt::one());
        let bytes = complement.magnitude().to_bytes_be();
        if bytes.len() > WORD_SIZE {
            return Err(WordError::SignedOverflow);
        }
        let mut out = [0xffu8; WORD_SIZE];
        let start = WORD_SIZE - bytes.len();
        for (dst, src) in out[start..].iter_mut().zip(bytes.iter()) {
            *dst = !src;
        }
        let word = Word(out);
        if !word.is_negative() {
            return Err(WordError::SignedOverflow);
        }
        Ok(word)
    }

    pub fn to_unsigned(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// Read as two's complement: if the top bit is set, invert, add one and negate
    pub fn to_signed(&self) -> BigInt {
        if !self.is_negative() {
            return BigInt::from_biguint(Sign::Plus, self.to_unsigned());
        }
        let inverted: Vec<u8> = self.0.iter().map(|b| !b).collect();
        let magnitude = BigUint::from_bytes_be(&inverted) + BigUint::one();
        -BigInt::from_biguint(Sign::Plus, magnitude)
    }

    /// Native value, or `None` if the unsigned value does not fit in a u64
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..WORD_SIZE - 8].iter().any(|b| *b != 0) {
            return None;
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&self.0[WORD_SIZE - 8..]);
        Some(u64::from_be_bytes(tail))
    }

    pub fn to_usize(&self) -> Option<usize> {
        self.to_u64().and_then(|v| usize::try_from(v).ok())
    }

    pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; WORD_SIZE] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Sign bit of byte 0
    pub fn is_negative(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    pub fn to_hex(&self) -> String {
        HexCodec::serialize(&self.0)
    }

    pub fn to_short_hex(&self) -> String {
        HexCodec::serialize_short(&self.0)
    }

    fn left_padded(bytes: &[u8], fill: u8) -> Self {
        let mut out = [fill; WORD_SIZE];
        out[WORD_SIZE - bytes.len()..].copy_from_slice(bytes);
        Word(out)
    }
}

/// Range check shared by ABI integer encoding: does `value` fit in `bits` as two's complement?
pub(crate) fn fits_signed(value: &BigInt, bits: usize) -> bool {
    if bits == 0 {
        return false;
    }
    let limit = BigInt::one() << (bits - 1);
    if value.is_negative() {
        value >= &-limit
    } else {
        value < &limit
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self.to_hex())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Word {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for Word {
    type Error = WordError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl From<[u8; WORD_SIZE]> for Word {
    fn from(bytes: [u8; WORD_SIZE]) -> Self {
        Word(bytes)
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        let mut bytes = [0u8; WORD_SIZE];
        value.to_big_endian(&mut bytes);
        Word(bytes)
    }
}

impl From<Word> for U256 {
    fn from(word: Word) -> Self {
        U256::from_big_endian(&word.0)
    }
}

impl AsRef<[u8]> for Word {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
